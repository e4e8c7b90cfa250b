//! Notifications commands - list the inbox and mark messages read

use anyhow::{bail, Result};
use clap::Subcommand;

use crate::context::{AppContext, GlobalArgs};

#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    /// Show broadcast and personal notifications, newest first
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },
    /// Mark notifications as read
    Read {
        /// Notification ids
        ids: Vec<i64>,
        /// Mark every visible notification as read
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },
}

impl NotificationsCommand {
    pub async fn execute(&self, globals: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(globals).await?;
        let fmt = globals.formatter();
        let driver = ctx.require_profile().await?;
        let notifications = ctx.notifications();

        match self {
            NotificationsCommand::List { unread } => {
                let inbox = notifications.inbox(&driver).await?;
                let shown: Vec<_> = inbox
                    .notifications
                    .iter()
                    .filter(|n| !*unread || !inbox.is_read(n.id()))
                    .collect();

                if globals.is_json() {
                    let items: Vec<serde_json::Value> = shown
                        .iter()
                        .map(|n| {
                            serde_json::json!({
                                "id": n.id(),
                                "title": n.title(),
                                "message": n.message(),
                                "broadcast": n.is_broadcast(),
                                "created_at": n.created_at(),
                                "sent_by": n.sent_by(),
                                "read": inbox.is_read(n.id()),
                            })
                        })
                        .collect();
                    fmt.print_json(&serde_json::json!({
                        "unread": inbox.unread_count(),
                        "notifications": items,
                    }));
                } else {
                    fmt.success(&format!(
                        "{} notification{}, {} unread",
                        inbox.notifications.len(),
                        if inbox.notifications.len() == 1 { "" } else { "s" },
                        inbox.unread_count()
                    ));
                    for n in shown {
                        let marker = if inbox.is_read(n.id()) { " " } else { "*" };
                        let when = n
                            .created_at()
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        fmt.info(&format!("{marker} [{}] {when} {}", n.id(), n.title()));
                        if !n.message().is_empty() {
                            fmt.info(&format!("      {}", n.message()));
                        }
                    }
                }
            }
            NotificationsCommand::Read { ids, all } => {
                if *all {
                    let count = notifications.mark_all_read(&driver).await?;
                    fmt.success(&format!("Marked {count} notification(s) read"));
                } else if ids.is_empty() {
                    bail!("Give notification ids or --all");
                } else {
                    notifications.mark_read(&driver, ids).await?;
                    fmt.success(&format!("Marked {} notification(s) read", ids.len()));
                }
            }
        }
        Ok(())
    }
}
