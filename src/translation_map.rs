//! Controlled-vocabulary translation maps.
//!
//! A [`TranslationMap`] replaces extracted codes with display values, e.g.
//! MARC language codes with language names. Maps are built from pairs or
//! loaded from files found on a search path:
//!
//! - `<name>.yaml` / `<name>.yml`: a flat mapping of scalar keys to scalar values
//! - `<name>.properties`: `key = value` or `key: value` lines, `#` and `!`
//!   comments
//!
//! The reserved key `__default__` sets what happens to values the map does
//! not contain: `__passthrough__` keeps them, any other value replaces them.
//! Without it unmapped values pass through unchanged.
//!
//! [`TranslationMapRegistry`] resolves names to files once and caches the
//! loaded maps; rules hold the resulting `Arc<TranslationMap>`.

use crate::error::{MarcError, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Reserved key holding the miss policy.
pub const DEFAULT_KEY: &str = "__default__";

/// `__default__` value that keeps unmapped values.
pub const PASSTHROUGH: &str = "__passthrough__";

/// Environment variable listing translation map directories.
pub const TRANSLATION_MAP_PATH_ENV: &str = "TRANSLATION_MAP_PATH";

/// Directory searched when the environment variable is not set.
pub const DEFAULT_TRANSLATION_MAP_DIR: &str = "translation_maps";

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "properties"];

lazy_static! {
    static ref DEFAULT_REGISTRY: TranslationMapRegistry = TranslationMapRegistry::from_env();
}

/// What a map does with a value it has no entry for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MissPolicy {
    /// Keep the value unchanged
    #[default]
    PassThrough,
    /// Replace the value with a fixed string
    Default(String),
    /// Remove the value
    Drop,
}

/// A lookup table from raw values to normalized values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMap {
    name: String,
    entries: HashMap<String, String>,
    miss_policy: MissPolicy,
}

impl TranslationMap {
    /// Build a map from key/value pairs.
    ///
    /// A `__default__` pair sets the miss policy instead of becoming an entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use marc_extract::translation_map::TranslationMap;
    ///
    /// let pairs = [("eng", "English"), ("fre", "French")];
    /// let map = TranslationMap::from_pairs("marc_languages", pairs);
    /// assert_eq!(map.translate("eng"), Some("English"));
    /// assert_eq!(map.translate("ger"), None);
    /// ```
    pub fn from_pairs<I, K, V>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::named(name);
        for (key, value) in pairs {
            map.insert(key.into(), value.into());
        }
        map
    }

    fn named(name: impl Into<String>) -> Self {
        TranslationMap {
            name: name.into(),
            ..TranslationMap::default()
        }
    }

    /// Replace the miss policy.
    #[must_use]
    pub fn with_miss_policy(mut self, policy: MissPolicy) -> Self {
        self.miss_policy = policy;
        self
    }

    fn insert(&mut self, key: String, value: String) {
        if key == DEFAULT_KEY {
            self.miss_policy = if value == PASSTHROUGH {
                MissPolicy::PassThrough
            } else {
                MissPolicy::Default(value)
            };
        } else {
            self.entries.insert(key, value);
        }
    }

    /// Parse a map from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the text is not a mapping
    /// of scalars.
    pub fn from_yaml_str(name: &str, yaml: &str) -> Result<Self> {
        let invalid = |detail: String| {
            MarcError::ConfigurationError(format!("Translation map '{name}': {detail}"))
        };

        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| invalid(format!("invalid YAML: {e}")))?;
        let mapping = match value {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            _ => return Err(invalid("expected a mapping".to_string())),
        };

        let mut map = Self::named(name);
        for (key, value) in mapping {
            let key = yaml_scalar(&key).ok_or_else(|| invalid(format!("non-scalar key {key:?}")))?;
            let value = yaml_scalar(&value)
                .ok_or_else(|| invalid(format!("non-scalar value for key '{key}'")))?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Parse a map from Java-style `.properties` text.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] for a non-comment line without
    /// a `=` or `:` separator.
    pub fn from_properties_str(name: &str, text: &str) -> Result<Self> {
        let mut map = Self::named(name);

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = line
                .split_once(|c: char| c == '=' || c == ':')
                .ok_or_else(|| {
                    MarcError::ConfigurationError(format!(
                        "Translation map '{name}': line {} has no '=' or ':'",
                        number + 1
                    ))
                })?;
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(map)
    }

    /// Load a map from a `.yaml`, `.yml` or `.properties` file.
    ///
    /// The map is named after the file stem.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the file cannot be read,
    /// has an unknown extension, or does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let text = fs::read_to_string(path).map_err(|e| {
            MarcError::ConfigurationError(format!(
                "Failed to read translation map {}: {e}",
                path.display()
            ))
        })?;

        let map = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&name, &text)?,
            Some("properties") => Self::from_properties_str(&name, &text)?,
            _ => {
                return Err(MarcError::ConfigurationError(format!(
                    "Unsupported translation map file {}",
                    path.display()
                )))
            },
        };

        debug!(
            name = %map.name,
            path = %path.display(),
            entries = map.len(),
            "loaded translation map"
        );
        Ok(map)
    }

    /// The map's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries, not counting `__default__`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// What happens to unmapped values.
    #[must_use]
    pub fn miss_policy(&self) -> &MissPolicy {
        &self.miss_policy
    }

    /// The entry for `key`, ignoring the miss policy.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The translation of `value`: its entry, or the default value for a
    /// [`MissPolicy::Default`] map. `None` means the value has no translation.
    #[must_use]
    pub fn translate(&self, value: &str) -> Option<&str> {
        self.get(value).or(match &self.miss_policy {
            MissPolicy::Default(default) => Some(default.as_str()),
            MissPolicy::PassThrough | MissPolicy::Drop => None,
        })
    }

    /// Translate every value in place, keeping positions.
    ///
    /// Unmapped values are kept, replaced or removed according to the miss
    /// policy.
    pub fn translate_in_place(&self, values: &mut Vec<String>) {
        values.retain_mut(|value| match self.entries.get(value.as_str()) {
            Some(mapped) => {
                mapped.clone_into(value);
                true
            },
            None => match &self.miss_policy {
                MissPolicy::PassThrough => true,
                MissPolicy::Default(default) => {
                    default.clone_into(value);
                    true
                },
                MissPolicy::Drop => false,
            },
        });
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolves translation map names to loaded, shared maps.
///
/// Names are looked up as `<name>.yaml`, `<name>.yml` and `<name>.properties`
/// in each search directory in turn; a name that already carries one of those
/// extensions is used as is. Loaded maps are cached for the registry's
/// lifetime.
#[derive(Debug, Default)]
pub struct TranslationMapRegistry {
    search_paths: Vec<PathBuf>,
    cache: RwLock<HashMap<String, Arc<TranslationMap>>>,
}

impl TranslationMapRegistry {
    /// Create a registry searching `paths` in order.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        TranslationMapRegistry {
            search_paths: paths.into_iter().map(Into::into).collect(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry from `TRANSLATION_MAP_PATH`, falling back to
    /// `./translation_maps`.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var_os(TRANSLATION_MAP_PATH_ENV) {
            Some(paths) => Self::new(std::env::split_paths(&paths)),
            None => Self::new([DEFAULT_TRANSLATION_MAP_DIR]),
        }
    }

    /// The process-wide registry used by rules built without an explicit one.
    #[must_use]
    pub fn global() -> &'static TranslationMapRegistry {
        &DEFAULT_REGISTRY
    }

    /// Directories searched for map files.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Make `map` resolvable as `name`, replacing any cached map of that name.
    pub fn register(&self, name: impl Into<String>, map: TranslationMap) -> Arc<TranslationMap> {
        let map = Arc::new(map);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Arc::clone(&map));
        map
    }

    /// Resolve `name` to a map, loading and caching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if no file for `name` exists
    /// on the search path or the file does not parse.
    pub fn resolve(&self, name: &str) -> Result<Arc<TranslationMap>> {
        if let Some(map) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(map));
        }

        let path = self.find_file(name).ok_or_else(|| {
            MarcError::ConfigurationError(format!(
                "Translation map '{name}' not found in {:?}",
                self.search_paths
            ))
        })?;
        let map = TranslationMap::load(&path)?;

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let map = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(map));
        Ok(Arc::clone(map))
    }

    fn find_file(&self, name: &str) -> Option<PathBuf> {
        let has_extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext));

        if has_extension && Path::new(name).is_absolute() {
            return Some(PathBuf::from(name)).filter(|path| path.is_file());
        }

        self.search_paths.iter().find_map(|dir| {
            if has_extension {
                Some(dir.join(name)).filter(|path| path.is_file())
            } else {
                EXTENSIONS
                    .iter()
                    .map(|ext| dir.join(format!("{name}.{ext}")))
                    .find(|path| path.is_file())
            }
        })
    }
}
