//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - `ConfigStore`: store chiave/valore a sezioni, caricato da file TOML
//! - Generazione del file di default quando non esiste
//! - Accessor tipizzati (`get_string`, `get_int`, `get_bool`) con fallback
//! - `Settings`: configurazione fortemente tipizzata risolta UNA volta al load
//!
//! ## Sezioni e default:
//! - `[compression]`: level 6, max_workers "auto", strip_metadata true,
//!   optimize_alpha false, fast_evaluation false, timeout 0 (nessun timeout)
//! - `[logging]`: show_progress, show_file_sizes, show_summary, emoji_style
//!   (tutti true), verbose_logging false, json_output false
//! - `[advanced]`: custom_filters "NoOp,Sub,Up,Average,Paeth",
//!   deflate_method "libdeflate", deflate_level 12, interlace "None"
//!
//! ## Fallback:
//! Una chiave assente, di tipo sbagliato o non parsabile non è mai un errore:
//! si usa il fallback esplicito, altrimenti il default built-in.
//!
//! ## Esempio:
//! ```rust,ignore
//! let store = ConfigStore::load(Path::new("optimizer.toml")).await;
//! let settings = Settings::from_store(&store);
//! let level = store.get_int("compression", "level", None);
//! ```

use crate::codec::{DeflateMethod, Filter, Interlace};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml::{Table, Value};
use tracing::{info, warn};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "optimizer.toml";

/// Built-in defaults, section by section, in the order they are documented
const DEFAULTS: &[(&str, &[(&str, &str)])] = &[
    (
        "compression",
        &[
            ("level", "6"),
            ("max_workers", "auto"),
            ("strip_metadata", "true"),
            ("optimize_alpha", "false"),
            ("fast_evaluation", "false"),
            ("timeout", "0"),
        ],
    ),
    (
        "logging",
        &[
            ("show_progress", "true"),
            ("show_file_sizes", "true"),
            ("show_summary", "true"),
            ("emoji_style", "true"),
            ("verbose_logging", "false"),
            ("json_output", "false"),
        ],
    ),
    (
        "advanced",
        &[
            ("custom_filters", "NoOp,Sub,Up,Average,Paeth"),
            ("deflate_method", "libdeflate"),
            ("deflate_level", "12"),
            ("interlace", "None"),
        ],
    ),
];

/// Built-in default for a key, if the key is known
pub fn builtin_default(section: &str, key: &str) -> Option<&'static str> {
    DEFAULTS
        .iter()
        .find(|(name, _)| *name == section)
        .and_then(|(_, keys)| keys.iter().find(|(k, _)| *k == key))
        .map(|(_, value)| *value)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Typed TOML value for a default, so the generated file reads naturally
fn typed_default(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        Value::Integer(n)
    } else if raw == "true" || raw == "false" {
        Value::Boolean(raw == "true")
    } else {
        Value::String(raw.to_string())
    }
}

/// Loosely typed section -> key -> value store backed by a TOML file
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    table: Table,
    source: Option<PathBuf>,
}

impl ConfigStore {
    /// Store with no backing values; every lookup resolves to its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: Table = content.parse()?;
        Ok(Self { table, source: None })
    }

    /// Load configuration from `path`, creating it with defaults if absent.
    ///
    /// Never fails: unreadable or unparsable files are logged and the
    /// defaults are used instead.
    pub async fn load(path: &Path) -> Self {
        if !path.exists() {
            match Self::write_defaults(path).await {
                Ok(()) => info!("📝 Created default config at {}", path.display()),
                Err(e) => warn!("Could not create default config at {}: {}", path.display(), e),
            }
            return Self::new();
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read config {}: {} (using defaults)", path.display(), e);
                return Self::new();
            }
        };

        match Self::from_toml_str(&content) {
            Ok(mut store) => {
                info!("📁 Loaded config from {}", path.display());
                store.source = Some(path.to_path_buf());
                store
            }
            Err(e) => {
                warn!("Malformed config {}: {} (using defaults)", path.display(), e);
                Self::new()
            }
        }
    }

    /// File the values were read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Full default configuration rendered as TOML
    pub fn default_file_contents() -> Result<String> {
        let mut root = Table::new();
        for (section, keys) in DEFAULTS {
            let mut table = Table::new();
            for (key, value) in *keys {
                table.insert(key.to_string(), typed_default(value));
            }
            root.insert(section.to_string(), Value::Table(table));
        }

        let body = toml::to_string(&root)?;
        Ok(format!(
            "# PNG batch optimizer configuration\n# Delete this file to regenerate the defaults.\n\n{}",
            body
        ))
    }

    /// Save the default configuration to `path`
    pub async fn write_defaults(path: &Path) -> Result<()> {
        let content = Self::default_file_contents()?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn raw(&self, section: &str, key: &str) -> Option<&Value> {
        self.table.get(section)?.as_table()?.get(key)
    }

    /// String value of a key; numbers, booleans and string arrays are accepted
    pub fn get_string(&self, section: &str, key: &str, fallback: Option<&str>) -> String {
        let stored = self.raw(section, key).and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(|names| names.join(",")),
            _ => None,
        });

        stored
            .or_else(|| fallback.map(str::to_string))
            .or_else(|| builtin_default(section, key).map(str::to_string))
            .unwrap_or_default()
    }

    /// Integer value of a key; numeric strings are accepted
    pub fn get_int(&self, section: &str, key: &str, fallback: Option<i64>) -> i64 {
        let stored = self.raw(section, key).and_then(|value| match value {
            Value::Integer(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        stored
            .or(fallback)
            .or_else(|| builtin_default(section, key).and_then(|raw| raw.parse().ok()))
            .unwrap_or(0)
    }

    /// Boolean value of a key; accepts `1/0`, `yes/no`, `true/false`, `on/off`
    pub fn get_bool(&self, section: &str, key: &str, fallback: Option<bool>) -> bool {
        let stored = self.raw(section, key).and_then(|value| match value {
            Value::Boolean(b) => Some(*b),
            Value::Integer(1) => Some(true),
            Value::Integer(0) => Some(false),
            Value::String(s) => parse_bool(s),
            _ => None,
        });

        stored
            .or(fallback)
            .or_else(|| builtin_default(section, key).and_then(parse_bool))
            .unwrap_or(false)
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workers {
    /// One worker per logical CPU
    Auto,
    /// At most this many workers, never more than there are files
    Fixed(usize),
}

impl Workers {
    /// Parse `max_workers`; anything that is not a positive integer is `Auto`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => Self::Fixed(n),
            _ => Self::Auto,
        }
    }

    /// Number of workers to start for `file_count` files on `cpus` logical CPUs
    pub fn resolve(self, file_count: usize, cpus: usize) -> usize {
        match self {
            Self::Auto => cpus.max(1),
            Self::Fixed(n) => n.min(file_count).max(1),
        }
    }
}

impl std::fmt::Display for Workers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Fixed(n) => write!(f, "{}", n),
        }
    }
}

/// Logical CPUs available to this process
pub fn logical_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// `[compression]` section
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionSettings {
    pub level: i64,
    pub workers: Workers,
    pub strip_metadata: bool,
    pub optimize_alpha: bool,
    pub fast_evaluation: bool,
    /// Per-file codec timeout; `None` means unbounded
    pub timeout: Option<Duration>,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub show_progress: bool,
    pub show_file_sizes: bool,
    pub show_summary: bool,
    pub emoji_style: bool,
    pub verbose_logging: bool,
    pub json_output: bool,
}

/// `[advanced]` section
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedSettings {
    /// Never empty
    pub filters: Vec<Filter>,
    pub deflate_method: DeflateMethod,
    pub deflate_level: i64,
    pub interlace: Interlace,
}

/// Configuration resolved from a `ConfigStore`, immutable for the whole run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub compression: CompressionSettings,
    pub logging: LoggingSettings,
    pub advanced: AdvancedSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_store(&ConfigStore::new())
    }
}

impl Settings {
    /// Resolve every key once, applying fallbacks and name mappings
    pub fn from_store(store: &ConfigStore) -> Self {
        let timeout = store.get_int("compression", "timeout", None);

        Self {
            compression: CompressionSettings {
                level: store.get_int("compression", "level", None),
                workers: Workers::parse(&store.get_string("compression", "max_workers", None)),
                strip_metadata: store.get_bool("compression", "strip_metadata", None),
                optimize_alpha: store.get_bool("compression", "optimize_alpha", None),
                fast_evaluation: store.get_bool("compression", "fast_evaluation", None),
                timeout: u64::try_from(timeout)
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
            logging: LoggingSettings {
                show_progress: store.get_bool("logging", "show_progress", None),
                show_file_sizes: store.get_bool("logging", "show_file_sizes", None),
                show_summary: store.get_bool("logging", "show_summary", None),
                emoji_style: store.get_bool("logging", "emoji_style", None),
                verbose_logging: store.get_bool("logging", "verbose_logging", None),
                json_output: store.get_bool("logging", "json_output", None),
            },
            advanced: AdvancedSettings {
                filters: Filter::parse_list(&store.get_string("advanced", "custom_filters", None)),
                deflate_method: DeflateMethod::from_name(
                    &store.get_string("advanced", "deflate_method", None),
                ),
                deflate_level: store.get_int("advanced", "deflate_level", None),
                interlace: Interlace::from_name(&store.get_string("advanced", "interlace", None)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.compression.level, 6);
        assert_eq!(settings.compression.workers, Workers::Auto);
        assert!(settings.compression.strip_metadata);
        assert!(!settings.compression.optimize_alpha);
        assert!(!settings.compression.fast_evaluation);
        assert_eq!(settings.compression.timeout, None);
        assert!(settings.logging.show_summary);
        assert!(!settings.logging.verbose_logging);
        assert!(!settings.logging.json_output);
        assert_eq!(
            settings.advanced.filters,
            vec![Filter::NoOp, Filter::Sub, Filter::Up, Filter::Average, Filter::Paeth]
        );
        assert_eq!(settings.advanced.deflate_method, DeflateMethod::Libdeflate);
        assert_eq!(settings.advanced.deflate_level, 12);
        assert_eq!(settings.advanced.interlace, Interlace::None);
    }

    #[test]
    fn test_lookup_fallback_order() {
        let store = ConfigStore::from_toml_str("[compression]\nlevel = 3\n").unwrap();

        assert_eq!(store.get_int("compression", "level", Some(9)), 3);
        assert_eq!(store.get_int("compression", "timeout", Some(30)), 30);
        assert_eq!(store.get_int("compression", "timeout", None), 0);
        assert_eq!(store.get_int("nowhere", "unknown", None), 0);
        assert_eq!(store.get_string("nowhere", "unknown", None), "");
        assert!(!store.get_bool("nowhere", "unknown", None));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let store = ConfigStore::from_toml_str(
            r#"
[compression]
level = "six"
strip_metadata = "maybe"
max_workers = [1, 2]

[advanced]
deflate_level = 3.5
"#,
        )
        .unwrap();

        assert_eq!(store.get_int("compression", "level", None), 6);
        assert_eq!(store.get_int("compression", "level", Some(2)), 2);
        assert!(store.get_bool("compression", "strip_metadata", None));
        assert!(!store.get_bool("compression", "strip_metadata", Some(false)));
        assert_eq!(store.get_string("compression", "max_workers", None), "auto");
        assert_eq!(store.get_int("advanced", "deflate_level", None), 12);
    }

    #[test]
    fn test_loose_typing() {
        let store = ConfigStore::from_toml_str(
            r#"
[compression]
level = " 4 "
strip_metadata = "No"
optimize_alpha = 1
max_workers = 8

[advanced]
custom_filters = ["Sub", "Paeth"]
"#,
        )
        .unwrap();

        assert_eq!(store.get_int("compression", "level", None), 4);
        assert!(!store.get_bool("compression", "strip_metadata", None));
        assert!(store.get_bool("compression", "optimize_alpha", None));
        assert_eq!(store.get_string("compression", "max_workers", None), "8");
        assert_eq!(store.get_string("advanced", "custom_filters", None), "Sub,Paeth");
    }

    #[test]
    fn test_section_that_is_not_a_table() {
        let store = ConfigStore::from_toml_str("compression = 5\n").unwrap();
        assert_eq!(store.get_int("compression", "level", None), 6);
    }

    #[test]
    fn test_workers_parse_and_resolve() {
        assert_eq!(Workers::parse("auto"), Workers::Auto);
        assert_eq!(Workers::parse("AUTO"), Workers::Auto);
        assert_eq!(Workers::parse("8"), Workers::Fixed(8));
        assert_eq!(Workers::parse("0"), Workers::Auto);
        assert_eq!(Workers::parse("-2"), Workers::Auto);
        assert_eq!(Workers::parse("lots"), Workers::Auto);

        assert_eq!(Workers::Auto.resolve(3, 16), 16);
        assert_eq!(Workers::Fixed(8).resolve(3, 16), 3);
        assert_eq!(Workers::Fixed(2).resolve(10, 16), 2);
    }

    #[test]
    fn test_settings_resolution() {
        let store = ConfigStore::from_toml_str(
            r#"
[compression]
max_workers = "2"
timeout = 30

[advanced]
custom_filters = "Bogus, Up ,Up,Brute"
deflate_method = "zopfli"
deflate_level = 15
interlace = "Adam7"
"#,
        )
        .unwrap();
        let settings = Settings::from_store(&store);

        assert_eq!(settings.compression.workers, Workers::Fixed(2));
        assert_eq!(settings.compression.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.advanced.filters, vec![Filter::Up, Filter::Brute]);
        assert_eq!(settings.advanced.deflate_method, DeflateMethod::Zopfli);
        assert_eq!(settings.advanced.deflate_level, 15);
        assert_eq!(settings.advanced.interlace, Interlace::Adam7);
    }

    #[test]
    fn test_negative_timeout_is_unbounded() {
        let store = ConfigStore::from_toml_str("[compression]\ntimeout = -5\n").unwrap();
        assert_eq!(Settings::from_store(&store).compression.timeout, None);
    }

    #[test]
    fn test_default_file_round_trips_to_defaults() {
        let content = ConfigStore::default_file_contents().unwrap();
        assert!(content.contains("[compression]"));
        assert!(content.contains("[logging]"));
        assert!(content.contains("[advanced]"));

        let store = ConfigStore::from_toml_str(&content).unwrap();
        assert_eq!(Settings::from_store(&store), Settings::default());
    }

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);

        let store = ConfigStore::load(&path).await;
        assert!(path.exists());
        assert!(store.source().is_none());
        assert_eq!(Settings::from_store(&store), Settings::default());

        let reloaded = ConfigStore::load(&path).await;
        assert_eq!(reloaded.source(), Some(path.as_path()));
        assert_eq!(reloaded.get_int("compression", "level", None), 6);
    }

    #[tokio::test]
    async fn test_load_malformed_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "[compression\nlevel = = 3").unwrap();

        let store = ConfigStore::load(&path).await;
        assert_eq!(Settings::from_store(&store), Settings::default());
    }
}
