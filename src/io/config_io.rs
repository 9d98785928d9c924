use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::model::config::StoreConfig;
use crate::table::PageSize;

pub const CONFIG_FILE: &str = "config.toml";

/// Keys accepted by `tg config get/set`
pub const CONFIG_KEYS: [&str; 4] = [
    "store.history_limit",
    "store.id_policy",
    "view.filter_mode",
    "view.page_size",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Syntax(#[from] toml_edit::TomlError),
    #[error("unknown config key '{0}' (expected one of: {keys})", keys = CONFIG_KEYS.join(", "))]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for format-preserving edits. A missing file reads as defaults
/// and an empty document.
pub fn read_config(dir: &Path) -> Result<(StoreConfig, toml_edit::DocumentMut), ConfigError> {
    let path = config_path(dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    let config: StoreConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the document back to disk, preserving comments and layout
pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = config_path(dir);
    atomic_write(&path, doc.to_string().as_bytes())
        .map_err(|source| ConfigError::Write { path, source })
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    if !CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }
    key.split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

/// Effective value of a dotted key, defaults included
pub fn get_config_value(config: &StoreConfig, key: &str) -> Result<String, ConfigError> {
    split_key(key)?;
    let value = match key {
        "store.history_limit" => config.store.history_limit.to_string(),
        "store.id_policy" => enum_name(&config.store.id_policy),
        "view.filter_mode" => enum_name(&config.view.filter_mode),
        _ => config.view.page_size.to_string(),
    };
    Ok(value)
}

fn enum_name<T: serde::Serialize>(value: &T) -> String {
    toml::Value::try_from(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Set a dotted key in the document. The value is checked against the key's
/// type and the edited document must still parse as a valid config.
pub fn set_config_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    raw: &str,
) -> Result<(), ConfigError> {
    let (section, name) = split_key(key)?;
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    let value = match key {
        "store.history_limit" => {
            let n: i64 = raw
                .parse()
                .map_err(|_| invalid(format!("'{raw}' is not a whole number")))?;
            if n < 0 {
                return Err(invalid("must not be negative".into()));
            }
            toml_edit::value(n)
        }
        "view.page_size" => {
            let size = raw
                .parse::<usize>()
                .map_err(|_| invalid(format!("'{raw}' is not a whole number")))
                .and_then(|n| PageSize::new(n).map_err(|e| invalid(e.to_string())))?;
            toml_edit::value(size.get() as i64)
        }
        _ => toml_edit::value(raw),
    };

    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let previous = doc[section][name].clone();
    doc[section][name] = value;

    if let Err(e) = toml::from_str::<StoreConfig>(&doc.to_string()) {
        doc[section][name] = previous;
        return Err(invalid(e.message().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{FilterMode, IdPolicy};
    use tempfile::TempDir;

    const TEMPLATE: &str = include_str!("../templates/config.toml");

    #[test]
    fn test_round_trip_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(config_path(tmp.path()), TEMPLATE).unwrap();

        let (_config, doc) = read_config(tmp.path()).unwrap();
        write_config(tmp.path(), &doc).unwrap();

        let written = fs::read_to_string(config_path(tmp.path())).unwrap();
        assert_eq!(written, TEMPLATE);
    }

    #[test]
    fn test_missing_file_reads_defaults() {
        let tmp = TempDir::new().unwrap();
        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_set_preserves_comments() {
        let mut doc: toml_edit::DocumentMut = TEMPLATE.parse().unwrap();
        set_config_value(&mut doc, "store.id_policy", "size").unwrap();
        set_config_value(&mut doc, "view.page_size", "50").unwrap();
        let text = doc.to_string();
        assert!(text.contains("id_policy = \"size\""));
        assert!(text.contains("page_size = 50"));
        assert!(text.contains("# Rows per page: 10, 20 or 50"));

        let config: StoreConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.store.id_policy, IdPolicy::Size);
        assert_eq!(config.view.page_size, 50);
    }

    #[test]
    fn test_set_creates_missing_section() {
        let mut doc = toml_edit::DocumentMut::new();
        set_config_value(&mut doc, "view.filter_mode", "first").unwrap();
        let config: StoreConfig = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.view.filter_mode, FilterMode::First);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut doc: toml_edit::DocumentMut = TEMPLATE.parse().unwrap();
        let before = doc.to_string();

        assert!(matches!(
            set_config_value(&mut doc, "view.page_size", "15"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_config_value(&mut doc, "store.history_limit", "-1"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_config_value(&mut doc, "store.id_policy", "random"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_config_value(&mut doc, "view.colour", "red"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(doc.to_string(), before);
    }

    #[test]
    fn test_get_reports_effective_values() {
        let config: StoreConfig = toml::from_str("[view]\nfilter_mode = \"first\"\n").unwrap();
        assert_eq!(get_config_value(&config, "view.filter_mode").unwrap(), "first");
        assert_eq!(get_config_value(&config, "store.id_policy").unwrap(), "monotonic");
        assert_eq!(get_config_value(&config, "store.history_limit").unwrap(), "500");
        assert!(get_config_value(&config, "nope").is_err());
    }
}
