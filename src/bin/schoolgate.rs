use anyhow::Result;
use schoolgate::cli::{actions, start, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let (action, globals) = start()?;

    let result = actions::run::handle(action, &globals).await;

    telemetry::shutdown_tracer();

    result
}
