//! Auth commands - sign in, sign out and session status
//!
//! `login` checks the driver's credentials against the `drivers` table. The
//! profile is only kept on this machine with `--remember`; every other
//! command needs a remembered profile.

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{commands::read_secret, context::{AppContext, GlobalArgs}};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in with an id, name, email or phone number
    Login {
        /// Driver id, name, email or phone
        identifier: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Keep the profile for later commands
        #[arg(long)]
        remember: bool,
    },
    /// Forget the remembered profile
    Logout,
    /// Show the remembered profile
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, globals: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(globals).await?;
        let fmt = globals.formatter();
        let auth = ctx.auth();

        match self {
            AuthCommand::Login {
                identifier,
                password,
                remember,
            } => {
                let password = read_secret(password.as_deref(), "Password")?;
                match auth.login(identifier, &password, *remember).await {
                    Ok(profile) => {
                        info!(driver = %profile.name(), "Signed in from CLI");
                        if globals.is_json() {
                            fmt.print_json(&serde_json::json!({
                                "success": true,
                                "name": profile.name(),
                                "phone": profile.phone(),
                                "remembered": remember,
                            }));
                        } else {
                            fmt.success(&format!("Signed in as {}", profile.name()));
                            if !remember {
                                fmt.info("Profile not saved; pass --remember to stay signed in");
                            }
                        }
                    }
                    Err(e) => fmt.error(e.user_message()),
                }
            }
            AuthCommand::Logout => {
                auth.logout().await?;
                fmt.success("Signed out");
            }
            AuthCommand::Status => {
                let profile = auth.restore().await?;
                if globals.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "signed_in": profile.is_some(),
                        "name": profile.as_ref().map(|p| p.name()),
                        "phone": profile.as_ref().map(|p| p.phone()),
                    }));
                } else {
                    match profile {
                        Some(p) => {
                            fmt.success(&format!("Signed in as {}", p.name()));
                            if !p.phone().is_empty() {
                                fmt.info(&format!("Phone: {}", p.phone()));
                            }
                        }
                        None => fmt.warn("Not signed in"),
                    }
                }
            }
        }
        Ok(())
    }
}
