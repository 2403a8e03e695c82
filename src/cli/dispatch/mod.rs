use crate::cli::{
    actions::Action,
    commands::{ARG_API_BASE_URL, ARG_LOGIN, ARG_PASSWORD, ARG_TIMEOUT},
    globals::GlobalArgs,
};
use crate::config::DEFAULT_API_BASE_URL;
use crate::gateway::Method;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use serde_json::Value;

/// Map parsed arguments to the action to run and the global settings.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let mut globals = GlobalArgs::new(
        matches
            .get_one::<String>(ARG_API_BASE_URL)
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
    );

    if let Some(timeout) = matches.get_one::<u64>(ARG_TIMEOUT) {
        globals.timeout_seconds = *timeout;
    }

    if let Some(login) = matches.get_one::<String>(ARG_LOGIN) {
        let password = matches
            .get_one::<String>(ARG_PASSWORD)
            .ok_or_else(|| anyhow!("missing required argument: --password"))?;
        globals.set_credentials(login.clone(), SecretString::from(password.clone()));
    }

    let action = match matches.subcommand() {
        Some(("whoami", _)) => Action::Whoami,
        Some(("links", _)) => Action::Links,
        Some(("navigate", sub_m)) => Action::Navigate {
            path: sub_m
                .get_one::<String>("path")
                .cloned()
                .ok_or_else(|| anyhow!("missing required argument: PATH"))?,
        },
        Some(("call", sub_m)) => {
            let method = sub_m
                .get_one::<String>("method")
                .ok_or_else(|| anyhow!("missing required argument: METHOD"))?
                .parse::<Method>()?;
            let path = sub_m
                .get_one::<String>("path")
                .cloned()
                .ok_or_else(|| anyhow!("missing required argument: PATH"))?;
            let body = sub_m
                .get_one::<String>("data")
                .map(|data| serde_json::from_str::<Value>(data))
                .transpose()
                .context("--data must be valid JSON")?;

            Action::Call { method, path, body }
        }
        _ => return Err(anyhow!("unknown subcommand")),
    };

    Ok((action, globals))
}
