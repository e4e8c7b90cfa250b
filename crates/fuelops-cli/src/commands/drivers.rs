//! Drivers command - register driver accounts

use anyhow::Result;
use clap::Subcommand;

use crate::{commands::read_secret, context::{AppContext, GlobalArgs}};

#[derive(Debug, Subcommand)]
pub enum DriversCommand {
    /// Register a driver; only the SHA-256 of the password is stored
    Add {
        name: String,
        phone: String,
        #[arg(long)]
        email: Option<String>,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
}

impl DriversCommand {
    pub async fn execute(&self, globals: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(globals).await?;
        let fmt = globals.formatter();

        match self {
            DriversCommand::Add {
                name,
                phone,
                email,
                password,
            } => {
                let password = read_secret(password.as_deref(), "Password")?;
                let record = ctx
                    .auth()
                    .register_driver(name, phone, email.as_deref(), &password)
                    .await?;

                if globals.is_json() {
                    fmt.print_json(&serde_json::json!({
                        "id": record.id().value(),
                        "name": record.name(),
                        "phone": record.phone(),
                        "email": record.email(),
                        "active": record.is_active(),
                    }));
                } else {
                    fmt.success(&format!("Registered {} (id {})", record.name(), record.id()));
                }
            }
        }
        Ok(())
    }
}
