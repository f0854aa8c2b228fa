//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.local_config_file() {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let store = &ctx.config.store;
    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("data_path", &store.data_path);
    ctx.output.kv("timeout_ms", &store.timeout_ms.to_string());

    let analysis = &ctx.config.analysis;
    ctx.output.info("");
    ctx.output.info("[analysis]");
    ctx.output.kv("min_impressions", &analysis.min_impressions.to_string());
    ctx.output.kv("min_days", &analysis.min_days.to_string());
    ctx.output.kv("drop_threshold_ratio", &analysis.drop_threshold_ratio.to_string());
    ctx.output.kv("min_active_variants", &analysis.min_active_variants.to_string());
    ctx.output.kv("target_variants_per_slot", &analysis.target_variants_per_slot.to_string());
    ctx.output.kv("ctr_window_days", &analysis.ctr_window_days.to_string());
    ctx.output.kv("notify_only_on_change", &analysis.notify_only_on_change.to_string());

    let notify = &ctx.config.notify;
    ctx.output.info("");
    ctx.output.info("[notify]");
    ctx.output.kv("enabled", &notify.enabled.to_string());
    if let Some(dir) = &notify.report_dir {
        ctx.output.kv("report_dir", dir);
    }
    ctx.output.kv("timeout_ms", &notify.timeout_ms.to_string());

    if !ctx.config.environments.is_empty() {
        ctx.output.info("");
        ctx.output.info("Environments:");
        let mut names: Vec<&String> = ctx.config.environments.keys().collect();
        names.sort();
        for env in names {
            ctx.output.list_item(env);
        }
    }

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("shelf.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Err(e) = ctx.config.analysis.validate() {
        errors.push(format!("analysis: {}", e));
    }
    let analysis = &ctx.config.analysis;
    if analysis.target_variants_per_slot < analysis.active_floor() {
        warnings.push(format!(
            "analysis.target_variants_per_slot ({}) is below min_active_variants ({})",
            analysis.target_variants_per_slot,
            analysis.active_floor()
        ));
    }
    if ctx.config.store.data_path.trim().is_empty() {
        errors.push("store.data_path is required".to_string());
    }
    if ctx.config.store.timeout_ms == 0 {
        errors.push("store.timeout_ms must be greater than 0".to_string());
    }
    if ctx.config.notify.enabled && ctx.config.notify.timeout_ms == 0 {
        errors.push("notify.timeout_ms must be greater than 0".to_string());
    }

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }
    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");
    Ok(())
}
