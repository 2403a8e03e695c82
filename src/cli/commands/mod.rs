use crate::GIT_COMMIT_HASH;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub const ARG_API_BASE_URL: &str = "api-base-url";
pub const ARG_LOGIN: &str = "login";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_VERBOSITY: &str = "verbosity";

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn long_version() -> String {
    let short_hash = GIT_COMMIT_HASH.get(..7).unwrap_or(GIT_COMMIT_HASH);
    format!("{} ({short_hash})", env!("CARGO_PKG_VERSION"))
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("schoolgate")
        .about("Session-aware client for the school management API")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version())
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .short('u')
                .long("api-base-url")
                .help("Base URL of the school API")
                .default_value("http://localhost:3000")
                .env("SCHOOLGATE_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_LOGIN)
                .short('l')
                .long("login")
                .help("Sign in with this login before running the command")
                .env("SCHOOLGATE_LOGIN")
                .requires(ARG_PASSWORD)
                .global(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Password for --login")
                .env("SCHOOLGATE_PASSWORD")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .short('t')
                .long("timeout")
                .help("Per-request timeout in seconds")
                .default_value("10")
                .env("SCHOOLGATE_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SCHOOLGATE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(Command::new("whoami").about("Show the current identity"))
        .subcommand(
            Command::new("navigate")
                .about("Check whether the current identity may open a route")
                .arg(
                    Arg::new("path")
                        .help("Route path, for example /admin/groups")
                        .required(true),
                ),
        )
        .subcommand(Command::new("links").about("List the routes the current identity may open"))
        .subcommand(
            Command::new("call")
                .about("Send a request through the gateway and print the response")
                .arg(
                    Arg::new("method")
                        .help("HTTP method")
                        .value_parser(["GET", "POST", "PUT", "PATCH", "DELETE"])
                        .ignore_case(true)
                        .required(true),
                )
                .arg(Arg::new("path").help("API path, for example /groups").required(true))
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help("JSON request body"),
                ),
        )
}
