//! Push command - register a device token

use anyhow::Result;
use clap::Subcommand;
use fuelops_core::usecases::PushSyncOutcome;

use crate::context::{AppContext, GlobalArgs};

#[derive(Debug, Subcommand)]
pub enum PushCommand {
    /// Register `token` for the signed-in driver
    Register {
        token: String,
        /// Device platform (defaults to push.platform)
        #[arg(long)]
        platform: Option<String>,
    },
}

impl PushCommand {
    pub async fn execute(&self, globals: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(globals).await?;
        let fmt = globals.formatter();
        let driver = ctx.require_profile().await?;

        match self {
            PushCommand::Register { token, platform } => {
                let platform = platform
                    .clone()
                    .unwrap_or_else(|| ctx.config.push.platform.clone());
                let outcome = ctx.push().sync_token(token, &driver, &platform).await?;

                let synced = outcome == PushSyncOutcome::Synced;
                if globals.is_json() {
                    fmt.print_json(&serde_json::json!({ "synced": synced }));
                } else if synced {
                    fmt.success("Push token registered");
                } else {
                    fmt.success("Push token already registered");
                }
            }
        }
        Ok(())
    }
}
