use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const LOCAL_CONFIG_FILE: &str = "memtrail.toml";

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Target sampling period in seconds.
    pub rate: f64,
    /// Directory new session folders are created in.
    pub output_root: PathBuf,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            rate: 0.01,
            output_root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerConfig {
    #[serde(alias = "show_visualization")]
    pub show_gui: bool,
    pub tick_rate_ms: u64,
    /// How often `plot --follow` checks the session for new rows.
    pub follow_poll_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            show_gui: true,
            tick_rate_ms: 250,
            follow_poll_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Local,
}

impl ConfigScope {
    pub fn path(self) -> Option<PathBuf> {
        match self {
            ConfigScope::Global => global_config_path(),
            ConfigScope::Local => Some(PathBuf::from(LOCAL_CONFIG_FILE)),
        }
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("memtrail").join("config.toml"))
}

/// Effective configuration: global file, overridden key by key by the local
/// file in the working directory. Missing or broken files degrade to defaults.
pub fn load_config() -> Config {
    let global = global_config_path();
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    load_layered(global.as_deref(), Some(&local))
}

pub fn load_layered(global: Option<&Path>, local: Option<&Path>) -> Config {
    let layers: Vec<toml::Table> = [global, local]
        .into_iter()
        .flatten()
        .filter(|p| p.exists())
        .filter_map(read_table)
        .collect();

    if layers.is_empty() {
        tracing::warn!(
            "no memtrail config file found, using defaults (see `memtrail config --help`)"
        );
        return Config::default();
    }

    let mut merged = toml::Table::new();
    for layer in layers {
        merge_tables(&mut merged, layer);
    }
    config_from_table(merged)
}

pub fn load_config_from_path(path: &Path) -> Config {
    match read_table(path) {
        Some(table) => config_from_table(table),
        None => Config::default(),
    }
}

fn read_table(path: &Path) -> Option<toml::Table> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
            return None;
        }
    };
    match toml::from_str::<toml::Table>(&contents) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

fn config_from_table(table: toml::Table) -> Config {
    toml::Value::Table(table)
        .try_into::<Config>()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid config values, using defaults");
            Config::default()
        })
}

/// Recursively overlays `over` onto `base`; sub-tables merge, scalars replace.
fn merge_tables(base: &mut toml::Table, over: toml::Table) {
    for (key, value) in over {
        let merged = match (base.remove(&key), value) {
            (Some(toml::Value::Table(mut existing)), toml::Value::Table(incoming)) => {
                merge_tables(&mut existing, incoming);
                toml::Value::Table(existing)
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
}

/// Sets `section.key = value` in the file for `scope`, keeping other keys.
pub fn set_value(
    scope: ConfigScope,
    section: &str,
    key: &str,
    value: toml::Value,
) -> Result<PathBuf> {
    let path = scope.path().ok_or_else(|| Error::Config {
        path: PathBuf::from("<config dir>"),
        reason: "no config directory on this platform".to_string(),
    })?;
    set_value_at(&path, section, key, value)?;
    Ok(path)
}

pub fn set_value_at(path: &Path, section: &str, key: &str, value: toml::Value) -> Result<()> {
    let config_err = |reason: String| Error::Config {
        path: path.to_path_buf(),
        reason,
    };

    let mut table = if path.exists() {
        let contents = fs::read_to_string(path)?;
        toml::from_str::<toml::Table>(&contents).map_err(|e| config_err(e.to_string()))?
    } else {
        toml::Table::new()
    };

    let entry = table
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let toml::Value::Table(section_table) = entry else {
        return Err(config_err(format!("`{section}` is not a table")));
    };
    section_table.insert(key.to_string(), value);

    // Validate before writing so a bad value never lands on disk.
    toml::Value::Table(table.clone())
        .try_into::<Config>()
        .map_err(|e| config_err(e.to_string()))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let rendered = toml::to_string_pretty(&table).map_err(|e| config_err(e.to_string()))?;
    fs::write(path, rendered)?;
    Ok(())
}

pub fn render_config(config: &Config) -> String {
    toml::to_string_pretty(config).unwrap_or_default()
}
