use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use notes_core::config::{Config, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (tokens redacted)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcommand: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load .notes/config.yaml")?;

    match subcommand {
        ConfigSubcommand::Show => {
            let mut shown = config.clone();
            for t in &mut shown.auth.tokens {
                t.token = "********".to_string();
            }
            if json {
                print_json(&shown)?;
            } else {
                print!("{}", serde_yaml::to_string(&shown)?);
            }
            Ok(())
        }

        ConfigSubcommand::Validate => {
            let warnings = config.validate();
            if json {
                print_json(&warnings)?;
            } else if warnings.is_empty() {
                println!("config ok");
            } else {
                for w in &warnings {
                    let level = match w.level {
                        WarnLevel::Warning => "warning",
                        WarnLevel::Error => "error",
                    };
                    println!("{level}: {}", w.message);
                }
            }
            if warnings.iter().any(|w| w.level == WarnLevel::Error) {
                anyhow::bail!("config has errors");
            }
            Ok(())
        }
    }
}
