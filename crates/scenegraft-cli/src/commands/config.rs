//! Config command implementation.
//!
//! Manages CLI configuration.

use anyhow::Result;
use scenegraft_ops::{Config, CONFIG_KEYS};

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    println!("scenegraft Configuration");
    println!("{:-<40}", "");

    let concurrency = match config.sibling_concurrency {
        0 => "unbounded".to_string(),
        n => n.to_string(),
    };
    println!("Sibling Concurrency: {}", concurrency);
    println!("Enable Nodes:        {}", config.enable_nodes);
    println!(
        "Default Description: {}",
        config
            .default_description
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Accept dashed spellings of config keys (`sibling-concurrency`).
fn normalize_key(key: &str) -> String {
    match key {
        "concurrency" => "sibling_concurrency".to_string(),
        "description" => "default_description".to_string(),
        _ => key.replace('-', "_"),
    }
}

/// Set a configuration value.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key);
    config.set(&key, value)?;
    config.save()?;
    println!("Set {} to: {}", key, value);
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    let key = normalize_key(key);
    if !CONFIG_KEYS.contains(&key.as_str()) {
        anyhow::bail!(
            "Unknown config key: {}. Valid keys: {}",
            key,
            CONFIG_KEYS.join(", ")
        );
    }

    let value = config
        .get(&key)
        .unwrap_or_else(|| "(not set)".to_string());
    println!("{}", value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults");
    Ok(())
}
