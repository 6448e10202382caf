//! tgapp CLI: resolve the Mini-App session for the identity in the environment, register it
//! when the backend does not know it yet, or print the claim the host exposes.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tgapp_api::{select_auth_payload, HttpAccountService};
use tgapp_cli::{load_api_config, Cli, Commands, EnvIdentityProvider};
use tgapp_core::{init_tracing, mask_payload, IdentityProvider, RegistrationForm, Session};
use tgapp_session::{SessionManager, SessionState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let log_file = cli.log_file.clone().or_else(|| std::env::var("LOG_FILE").ok());
    init_tracing(log_file.as_deref())?;

    match cli.command {
        Commands::Whoami => handle_whoami(),
        Commands::Resolve => {
            let manager = build_manager(cli.api_url)?;
            let session = resolve(&manager).await?;
            print_session(&session)?;
            if matches!(session, Session::Failed(_)) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Register {
            first_name,
            last_name,
            role,
            timezone,
        } => {
            let manager = build_manager(cli.api_url)?;
            let session = match resolve(&manager).await? {
                Session::NeedsRegistration(external_id) => {
                    info!(external_id, "identity not registered; registering");
                    let form = RegistrationForm {
                        first_name,
                        last_name,
                        role,
                        timezone,
                    };
                    manager.register(form).await.context("Register account")?
                }
                other => {
                    println!("No registration needed.");
                    other
                }
            };
            print_session(&session)
        }
    }
}

fn build_manager(api_url: Option<String>) -> Result<SessionManager> {
    let config = load_api_config(api_url)
        .context("Load account service config (API_BASE_URL, API_TIMEOUT_SECS)")?;
    let service = HttpAccountService::new(&config)?;
    Ok(SessionManager::new(
        Arc::new(EnvIdentityProvider),
        Arc::new(service),
    ))
}

async fn resolve(manager: &SessionManager) -> Result<Session> {
    manager.start().await.with_context(|| match manager.state() {
        SessionState::SignedOut => "Session was signed out during resolution".to_string(),
        _ => "Resolution was abandoned".to_string(),
    })
}

fn print_session(session: &Session) -> Result<()> {
    match session {
        Session::Authenticated(account) => {
            println!(
                "Authenticated as {} ({})",
                account.display_name(),
                account.role
            );
            println!("{}", serde_json::to_string_pretty(account)?);
        }
        Session::NeedsRegistration(external_id) => {
            println!(
                "Telegram user {} has no account; run `tgapp register` to create one.",
                external_id
            );
        }
        Session::Failed(reason) => {
            println!("Session could not be established: {}", reason);
        }
    }
    Ok(())
}

fn handle_whoami() -> Result<()> {
    let Some(claim) = EnvIdentityProvider.claim() else {
        println!("Host unavailable: none of TG_USER_ID, TG_INIT_DATA, TG_AUTH, TG_LAUNCH_URL is set.");
        return Ok(());
    };
    match claim.observed_id() {
        Some(id) => println!("Telegram user id: {}", id),
        None => println!("Telegram user id: <not available>"),
    }
    match select_auth_payload(&claim) {
        Some((payload, source)) => {
            println!("Auth payload ({:?}): {}", source, mask_payload(&payload))
        }
        None => println!("Auth payload: <none>"),
    }
    Ok(())
}
