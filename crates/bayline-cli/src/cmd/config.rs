use crate::output::{print_json, print_settings};
use anyhow::Context;
use bayline_core::config::{Config, WarnLevel};
use clap::Subcommand;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (defaults filled in)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a config file with every default spelled out
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(path, json),
        ConfigSubcommand::Validate => validate(path, json),
        ConfigSubcommand::Init { force } => init(path, force),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    if json {
        return print_json(&config);
    }

    let t = &config.tracker;
    let policy = serde_json::to_value(t.mismatch_policy)?;
    print_settings(&[
        ("tracker.promotion_interval_secs", t.promotion_interval_secs.to_string()),
        ("tracker.expiry_interval_secs", t.expiry_interval_secs.to_string()),
        ("tracker.default_duration_minutes", t.default_duration_minutes.to_string()),
        ("tracker.default_location", t.default_location.clone()),
        ("tracker.mismatch_policy", policy.as_str().unwrap_or_default().to_string()),
        ("server.bind", config.server.bind.clone()),
        ("server.port", config.server.port.to_string()),
    ]);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
