//! Loader for pagekeep configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are added, then `PAGEKEEP_`-prefixed
//! environment variables win (`__` separates nesting levels, so
//! `PAGEKEEP_EXTRACTION__MAX_CHARS=5000` sets `extraction.max_chars`).
//! String values may reference other environment variables as `${VAR}`.
//! Every field has a default; see [`PagekeepConfig`].
use config::{Config, ConfigError, Environment, File};
use serde_json::Value;
use std::path::{Path, PathBuf};

mod settings;

pub use settings::{
    ExtractionConfig, FetchConfig, LoggingConfig, PagekeepConfig, ReadabilityConfig,
};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "PAGEKEEP";

/// `<config_dir>/pagekeep/pagekeep.yaml`, e.g. `~/.config/pagekeep/pagekeep.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pagekeep").join("pagekeep.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PagekeepConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    files: Vec<(PathBuf, bool)>,
    inline: Vec<String>,
}

impl Default for PagekeepConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PagekeepConfigLoader {
    /// Start from the built-in defaults; nothing is read until [`load`](Self::load).
    ///
    /// ```
    /// use pagekeep_config::PagekeepConfigLoader;
    ///
    /// let config = PagekeepConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nextraction:\n  max_chars: 2000")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.extraction.max_chars, 2000);
    /// assert_eq!(config.extraction.min_content_chars, 500);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Like [`with_file`](Self::with_file) but tolerates a missing file, so
    /// deployments can rely on environment variables alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Files are applied first, then inline snippets, then the environment.
    /// `${VAR}` placeholders are expanded before the typed structs are built
    /// and the extraction settings are validated.
    ///
    /// ```
    /// use pagekeep_config::PagekeepConfigLoader;
    ///
    /// unsafe { std::env::set_var("PK_DOC_HOST", "bookmarks.example.com"); }
    ///
    /// let config = PagekeepConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// extraction:
    ///   excluded_hosts: ["${PK_DOC_HOST}"]
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.extraction.excluded_hosts, vec!["bookmarks.example.com"]);
    ///
    /// unsafe { std::env::remove_var("PK_DOC_HOST"); }
    /// ```
    pub fn load(self) -> Result<PagekeepConfig, ConfigError> {
        let mut builder = self.builder;
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("extraction.excluded_hosts")
                .with_list_parse_key("extraction.allowed_tags"),
        );

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PagekeepConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.extraction.validate().map_err(ConfigError::Message)?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use temp_env;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("PK_SITE", Some("example.org"), || {
            let mut v = json!("https://${PK_SITE}/feed");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("https://example.org/feed"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("PK_A", Some("alpha")), ("PK_B", Some("beta"))], || {
            let mut v = json!([
                "host-$PK_A",
                { "pair": "${PK_A}-${PK_B}" },
                7,
                false,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["host-alpha", { "pair": "alpha-beta" }, 7, false, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("PK_LEAF", Some("leaf")),
                ("PK_MID", Some("mid-${PK_LEAF}")),
                ("PK_TOP", Some("top-${PK_MID}")),
            ],
            || {
                let mut v = json!("v=${PK_TOP}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("v=top-mid-leaf"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("PK_X", Some("${PK_Y}")), ("PK_Y", Some("${PK_X}"))], || {
            let mut v = json!("a=${PK_X}-b");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("a=") && s.ends_with("-b"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${PK_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${PK_DOES_NOT_EXIST}"));
    }

    #[test]
    fn default_path_ends_in_pagekeep_yaml() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("pagekeep/pagekeep.yaml"));
        }
    }
}
