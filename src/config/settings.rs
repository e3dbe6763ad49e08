use anyhow::Result;
use directories::ProjectDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::ExplorerConfig;

const APP_NAME: &str = "LibraryExplorer";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the explorer.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "libraryexplorer", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

fn resolve_directory(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the configuration from `dir` (or the platform directory).
///
/// A missing file is created with defaults. A file that cannot be parsed is
/// migrated field by field if possible, otherwise defaults are used.
pub fn load_config(dir: Option<&Path>) -> Result<ExplorerConfig> {
    let config_path = resolve_directory(dir)?.join(CONFIG_FILE);

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = ExplorerConfig::default();
        save_config(&default_config, dir)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match serde_json::from_str::<ExplorerConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            migrate_legacy_config(&config_content).or_else(|_| Ok(ExplorerConfig::default()))
        }
    }
}

/// Fills fields missing from an older config file with their defaults.
fn migrate_legacy_config(config_content: &str) -> Result<ExplorerConfig> {
    let mut value: Value = serde_json::from_str(config_content)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Config is not a JSON object"))?;

    let defaults = ExplorerConfig::default();

    let ensure_field = |obj: &mut serde_json::Map<String, Value>, key: &str, default_val: Value| {
        if !obj.contains_key(key) || obj.get(key) == Some(&Value::Null) {
            obj.insert(key.to_string(), default_val);
        }
    };

    ensure_field(
        obj,
        "collapse_debounce_ms",
        serde_json::to_value(defaults.collapse_debounce_ms)?,
    );
    ensure_field(
        obj,
        "max_file_name_length",
        serde_json::to_value(defaults.max_file_name_length)?,
    );

    // Older files may carry a partial panel section; complete it key by key.
    if !matches!(obj.get("super_update"), Some(Value::Object(_))) {
        obj.insert(
            "super_update".to_string(),
            Value::Object(serde_json::Map::new()),
        );
    }
    if let (Some(Value::Object(panel)), Value::Object(panel_defaults)) = (
        obj.get_mut("super_update"),
        serde_json::to_value(&defaults.super_update)?,
    ) {
        for (key, default_val) in panel_defaults {
            ensure_field(panel, &key, default_val);
        }
    }

    let migrated_config: ExplorerConfig = serde_json::from_value(Value::Object(obj.clone()))?;
    tracing::info!("Successfully migrated legacy config");
    Ok(migrated_config)
}

/// Saves the configuration to `dir` (or the platform directory).
pub fn save_config(config: &ExplorerConfig, dir: Option<&Path>) -> Result<()> {
    let config_dir = resolve_directory(dir)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        tracing::info!("Created config directory: {:?}", config_dir);
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

/// Exports the configuration to a user-specified JSON file.
pub fn export_config(config: &ExplorerConfig, export_path: &Path) -> Result<()> {
    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, config_json)?;
    tracing::info!("Exported config to {:?}", export_path);
    Ok(())
}

/// Imports a configuration from a user-specified JSON file.
pub fn import_config(import_path: &Path) -> Result<ExplorerConfig> {
    let config_content = fs::read_to_string(import_path)?;
    match serde_json::from_str::<ExplorerConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Imported config from {:?}", import_path);
            Ok(config)
        }
        Err(_) => {
            tracing::info!("Importing legacy config format from {:?}", import_path);
            migrate_legacy_config(&config_content)
        }
    }
}
