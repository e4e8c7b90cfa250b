//! Config command - show, validate and locate the configuration file

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use crate::context::{load_config, GlobalArgs};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, globals: &GlobalArgs) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(globals),
            ConfigCommand::Validate => self.execute_validate(globals),
            ConfigCommand::Path => {
                let path = globals.config_path.display().to_string();
                if globals.is_json() {
                    globals
                        .formatter()
                        .print_json(&serde_json::json!({ "path": path }));
                } else {
                    println!("{path}");
                }
                Ok(())
            }
        }
    }

    fn execute_show(&self, globals: &GlobalArgs) -> Result<()> {
        let formatter = globals.formatter();
        let mut config = load_config(&globals.config_path)?;
        if !config.backend.anon_key.is_empty() {
            config.backend.anon_key = "********".to_string();
        }

        info!(config_path = %globals.config_path.display(), "Showing configuration");

        if globals.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!(
                "Configuration ({})",
                globals.config_path.display()
            ));
            formatter.info("");
            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    fn execute_validate(&self, globals: &GlobalArgs) -> Result<()> {
        let formatter = globals.formatter();
        let path = &globals.config_path;

        let config = match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                if globals.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "errors": [format!("{e:#}")],
                    }));
                } else {
                    formatter.error(&format!("{e:#}"));
                }
                std::process::exit(1);
            }
        };

        let errors = config.validate();
        if globals.is_json() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "path": path.display().to_string(),
                "errors": messages,
            }));
        } else if errors.is_empty() {
            formatter.success(&format!("Configuration is valid ({})", path.display()));
        } else {
            formatter.error(&format!(
                "{} problem{} in {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                path.display()
            ));
            for e in &errors {
                formatter.info(&format!("- {e}"));
            }
        }

        if !errors.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}
