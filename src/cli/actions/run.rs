use crate::{
    cli::{actions::Action, globals::GlobalArgs},
    client::{types::LoginPayload, SchoolClient},
    config::ClientConfig,
    errors::AppError,
    gateway::{ApiRequest, Transport},
    identity::IdentityState,
    routes::{self, Decision},
};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// Handle the action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let config = ClientConfig::new(
        &globals.api_base_url,
        Duration::from_secs(globals.timeout_seconds),
    )?;
    let client = SchoolClient::connect(config)?;

    let output = execute(&client, action, globals).await?;
    println!("{output}");

    Ok(())
}

/// Runs `action` and returns what to print.
pub async fn execute<T: Transport>(
    client: &SchoolClient<T>,
    action: Action,
    globals: &GlobalArgs,
) -> Result<String> {
    if let Some(login) = &globals.login {
        let payload = LoginPayload::new(login.clone(), globals.password.clone());
        client.login(&payload).await.map_err(failure)?;
        info!(login = %login, "signed in");
    }

    match action {
        Action::Whoami => match client.resolve_identity().await.map_err(failure)? {
            IdentityState::Present(identity) => Ok(serde_json::to_string_pretty(&identity)?),
            IdentityState::Absent | IdentityState::Unresolved => Ok("not signed in".to_string()),
        },
        Action::Navigate { path } => Ok(describe(&client.navigate(&path).await)),
        Action::Links => {
            let state = client.resolve_identity().await.map_err(failure)?;
            let identity = state
                .identity()
                .ok_or_else(|| anyhow!("not signed in"))?;
            let links: Vec<String> = routes::links_for(identity.role())
                .iter()
                .map(ToString::to_string)
                .collect();
            Ok(links.join("\n"))
        }
        Action::Call { method, path, body } => {
            let request = ApiRequest {
                method,
                path,
                body,
            };
            let response = client.call(&request).await.map_err(failure)?;
            Ok(pretty(&response.body))
        }
    }
}

fn describe(decision: &Decision) -> String {
    match decision {
        Decision::Wait => "wait".to_string(),
        Decision::Allow(destination) => format!("allow {destination}"),
        Decision::Redirect(destination) => format!("redirect {destination}"),
    }
}

fn pretty(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}

fn failure(err: AppError) -> anyhow::Error {
    match err.status() {
        Some(status) => anyhow!("{} (HTTP {status})", err.user_message()),
        None => anyhow!(err.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::{describe, execute, failure, pretty};
    use crate::{
        cli::{actions::Action, globals::GlobalArgs},
        client::SchoolClient,
        config::ClientConfig,
        errors::{AppError, FailureBody},
        gateway::{testing::{ok, status, ScriptedTransport}, Method},
        routes::{Decision, Destination},
    };
    use secrecy::SecretString;

    fn client(transport: ScriptedTransport) -> SchoolClient<ScriptedTransport> {
        SchoolClient::with_transport(transport, ClientConfig::default())
    }

    #[test]
    fn describe_decisions() {
        assert_eq!(describe(&Decision::Wait), "wait");
        assert_eq!(
            describe(&Decision::Redirect(Destination::Login)),
            "redirect /login"
        );
        assert_eq!(
            describe(&Decision::Allow(Destination::TeacherTestDetails("4".to_string()))),
            "allow /teacher/tests/4"
        );
    }

    #[test]
    fn failure_keeps_user_message_and_status() {
        let err = failure(AppError::Http {
            status: 422,
            body: FailureBody::from_raw(r#"{"message":"Name required"}"#),
        });
        assert_eq!(err.to_string(), "Name required (HTTP 422)");
    }

    #[test]
    fn pretty_leaves_non_json_alone() {
        assert_eq!(pretty("plain"), "plain");
        assert_eq!(pretty(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn links_after_login() {
        let transport = ScriptedTransport::new();
        transport.script("/auth/login", [ok("")]);
        transport.script("/auth/me", [ok(r#"{"id":1,"role":"teacher"}"#)]);
        let client = client(transport);

        let mut globals = GlobalArgs::default();
        globals.set_credentials("t1".to_string(), SecretString::from("pw".to_string()));

        let output = execute(&client, Action::Links, &globals).await.unwrap();
        assert!(output.contains("/teacher/dashboard"));
        assert!(output.contains("/admin/groups"));
        assert!(!output.contains("/admin/teachers"));
    }

    #[tokio::test]
    async fn whoami_without_session() {
        let transport = ScriptedTransport::new();
        transport.script("/auth/me", [status(401, "")]);
        transport.script("/auth/refresh", [status(401, "")]);
        let client = client(transport);

        let output = execute(&client, Action::Whoami, &GlobalArgs::default())
            .await
            .unwrap();
        assert_eq!(output, "not signed in");
    }

    #[tokio::test]
    async fn call_surfaces_domain_failure_message() {
        let transport = ScriptedTransport::new();
        transport.script("/groups", [status(409, r#"{"error":"Group exists"}"#)]);
        let client = client(transport);

        let action = Action::Call {
            method: Method::Post,
            path: "/groups".to_string(),
            body: None,
        };
        let err = execute(&client, action, &GlobalArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Group exists (HTTP 409)");
    }
}
