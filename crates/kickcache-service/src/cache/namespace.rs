//! Namespace registry and extra-TTL loading.

use super::cache_keys::BUILTIN_NAMESPACES;
use kickcache_core::{CacheError, CacheResult};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A logical group of cached entries with its own key prefix and extra TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    prefix: String,
    extra_ttl: Duration,
}

impl Namespace {
    /// Creates a namespace with zero extra TTL.
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            extra_ttl: Duration::ZERO,
        }
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the lifetime added to entries beyond the next sweep.
    #[must_use]
    pub const fn extra_ttl(&self) -> Duration {
        self.extra_ttl
    }

    /// Returns the extra TTL in whole seconds.
    #[must_use]
    pub fn extra_ttl_secs(&self) -> i64 {
        i64::try_from(self.extra_ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

/// Name-indexed set of namespaces.
///
/// Mutated only while configuration is loaded; share it behind an `Arc`
/// afterwards so request handlers read a frozen view.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    namespaces: Vec<Namespace>,
    by_name: HashMap<String, usize>,
}

impl NamespaceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in namespaces with zero extra TTL.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, prefix, _) in BUILTIN_NAMESPACES {
            registry.namespaces.push(Namespace::new(name, prefix));
            registry
                .by_name
                .insert(name.to_string(), registry.namespaces.len() - 1);
        }
        registry
    }

    /// Registers a new namespace.
    ///
    /// Fails if the name or prefix is empty or already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> CacheResult<&Namespace> {
        let name = name.into();
        let prefix = prefix.into();

        if name.is_empty() || prefix.is_empty() {
            return Err(CacheError::configuration(
                "Namespace name and prefix must not be empty",
            ));
        }
        if self.by_name.contains_key(&name) {
            return Err(CacheError::configuration(format!(
                "Namespace '{}' is already registered",
                name
            )));
        }
        // Storage keys are prefix + key with no separator, so no prefix may
        // start another.
        if let Some(existing) = self
            .namespaces
            .iter()
            .find(|ns| ns.prefix.starts_with(&prefix) || prefix.starts_with(&ns.prefix))
        {
            return Err(CacheError::configuration(format!(
                "Prefix '{}' overlaps prefix '{}' of namespace '{}'",
                prefix, existing.prefix, existing.name
            )));
        }

        let index = self.namespaces.len();
        self.namespaces.push(Namespace::new(name.clone(), prefix));
        self.by_name.insert(name, index);
        Ok(&self.namespaces[index])
    }

    /// Looks up a namespace by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.by_name.get(name).map(|&index| &self.namespaces[index])
    }

    /// Iterates namespaces in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    /// Returns the number of registered namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Returns true if no namespace is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Overwrites the extra TTL of every namespace named in `mapping`.
    ///
    /// Unknown names are ignored. All recognized values are parsed before any
    /// namespace is touched, so a malformed value leaves the registry as it was.
    /// Returns the number of namespaces updated.
    pub fn apply_extra_ttl(&mut self, mapping: &Map<String, Value>) -> CacheResult<usize> {
        let mut updates = Vec::new();
        for (key, value) in mapping {
            let Some(&index) = self.by_name.get(key) else {
                debug!(key = %key, "Ignoring unknown extra TTL key");
                continue;
            };
            updates.push((index, parse_extra_ttl(key, value)?));
        }

        for &(index, ttl) in &updates {
            self.namespaces[index].extra_ttl = ttl;
        }
        Ok(updates.len())
    }

    /// Reads a JSON extra-TTL file and applies it.
    pub fn load_extra_ttl_file(&mut self, path: impl AsRef<Path>) -> CacheResult<usize> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CacheError::configuration(format!(
                "Failed to read extra TTL file '{}': {}",
                path.display(),
                e
            ))
        })?;
        self.apply_json(path, &contents)
    }

    /// Loads the extra-TTL file, writing the built-in defaults first if it is missing.
    ///
    /// The load is retried exactly once after the defaults are written; a
    /// second failure is returned to the caller.
    pub fn load_or_bootstrap(&mut self, path: impl AsRef<Path>) -> CacheResult<usize> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => self.apply_json(path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "Extra TTL file not found, writing built-in defaults"
                );
                write_default_extra_ttl(path)?;
                self.load_extra_ttl_file(path)
            }
            Err(e) => Err(CacheError::configuration(format!(
                "Failed to read extra TTL file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn apply_json(&mut self, path: &Path, contents: &str) -> CacheResult<usize> {
        let mapping: Map<String, Value> = serde_json::from_str(contents).map_err(|e| {
            CacheError::configuration(format!(
                "Extra TTL file '{}' is not a JSON object: {}",
                path.display(),
                e
            ))
        })?;

        let applied = self.apply_extra_ttl(&mapping)?;
        info!(path = %path.display(), applied, "Extra TTL loaded");
        Ok(applied)
    }
}

/// Returns the built-in extra-TTL mapping.
#[must_use]
pub fn default_extra_ttl() -> Map<String, Value> {
    BUILTIN_NAMESPACES
        .iter()
        .map(|(name, _, ttl)| ((*name).to_string(), Value::String((*ttl).to_string())))
        .collect()
}

/// Writes the built-in extra-TTL mapping to `path`.
pub fn write_default_extra_ttl(path: impl AsRef<Path>) -> CacheResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&default_extra_ttl())?;
    fs::write(path, json).map_err(|e| {
        CacheError::configuration(format!(
            "Failed to write extra TTL file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Parses integer seconds or a human-readable duration.
fn parse_extra_ttl(key: &str, value: &Value) -> CacheResult<Duration> {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .map(Duration::from_secs)
            .ok_or_else(|| "expected non-negative integer seconds".to_string()),
        Value::String(s) => humantime::parse_duration(s.trim()).map_err(|e| e.to_string()),
        _ => Err("expected integer seconds or a duration string".to_string()),
    };

    parsed.map_err(|reason| {
        CacheError::configuration(format!(
            "Extra TTL: cannot parse '{}' ('{}'): {}",
            value, key, reason
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cache_keys::{MATCH_INFO, SEARCH, TRANSFERS};
    use serde_json::json;

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_defaults_have_zero_extra_ttl() {
        let registry = NamespaceRegistry::with_defaults();
        assert_eq!(registry.len(), 10);
        assert!(registry.iter().all(|ns| ns.extra_ttl() == Duration::ZERO));
        assert_eq!(registry.get(MATCH_INFO).unwrap().prefix(), "4");
        assert!(registry.get("UNKNOWN").is_none());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = NamespaceRegistry::with_defaults();

        assert!(registry.register(MATCH_INFO, "x").is_err());
        assert!(registry.register("PLAYER_INFO", "4").is_err());
        assert!(registry.register("PLAYER_INFO", "40").is_err());
        assert!(registry.register("", "y").is_err());
        assert_eq!(registry.len(), 10);

        let ns = registry.register("PLAYER_INFO", "a").unwrap();
        assert_eq!(ns.name(), "PLAYER_INFO");
        assert_eq!(registry.len(), 11);
    }

    #[test]
    fn test_register_rejects_prefix_overlap() {
        let mut registry = NamespaceRegistry::new();
        registry.register("LONG", "ab").unwrap();

        let err = registry.register("SHORT", "a").unwrap_err();
        assert!(matches!(err, CacheError::Configuration(_)));
        assert!(registry.register("LONGER", "abc").is_err());

        registry.register("OTHER", "b").unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_apply_integers_and_durations() {
        let mut registry = NamespaceRegistry::with_defaults();
        let applied = registry
            .apply_extra_ttl(&mapping(json!({
                "MATCH_INFO": 60,
                "TRANSFERS": "12h",
                "SEARCH": "1h 30m",
                "NOT_A_NAMESPACE": "garbage"
            })))
            .unwrap();

        assert_eq!(applied, 3);
        assert_eq!(registry.get(MATCH_INFO).unwrap().extra_ttl_secs(), 60);
        assert_eq!(registry.get(TRANSFERS).unwrap().extra_ttl_secs(), 12 * 3600);
        assert_eq!(registry.get(SEARCH).unwrap().extra_ttl_secs(), 5400);
    }

    #[test]
    fn test_malformed_value_fails_whole_load() {
        let mut registry = NamespaceRegistry::with_defaults();
        let err = registry
            .apply_extra_ttl(&mapping(json!({
                "MATCH_INFO": 60,
                "TRANSFERS": "twelve hours"
            })))
            .unwrap_err();

        assert!(matches!(err, CacheError::Configuration(_)));
        assert!(err.to_string().contains("TRANSFERS"));
        assert!(err.to_string().contains("twelve hours"));
        assert_eq!(registry.get(MATCH_INFO).unwrap().extra_ttl_secs(), 0);
    }

    #[test]
    fn test_rejects_negative_float_and_bool() {
        for bad in [json!(-5), json!(1.5), json!(true), json!(null)] {
            let mut registry = NamespaceRegistry::with_defaults();
            let result = registry.apply_extra_ttl(&mapping(json!({ "MATCH_INFO": bad })));
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra_ttl.json");
        fs::write(&path, r#"{"MATCH_INFO": "1m", "SEARCH": 3}"#).unwrap();

        let mut registry = NamespaceRegistry::with_defaults();
        assert_eq!(registry.load_extra_ttl_file(&path).unwrap(), 2);
        assert_eq!(registry.get(MATCH_INFO).unwrap().extra_ttl_secs(), 60);
        assert_eq!(registry.get(SEARCH).unwrap().extra_ttl_secs(), 3);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = NamespaceRegistry::with_defaults();

        let err = registry
            .load_extra_ttl_file(dir.path().join("missing.json"))
            .unwrap_err();
        assert!(matches!(err, CacheError::Configuration(_)));
    }

    #[test]
    fn test_load_non_object_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra_ttl.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let mut registry = NamespaceRegistry::with_defaults();
        assert!(registry.load_extra_ttl_file(&path).is_err());
    }

    #[test]
    fn test_bootstrap_writes_defaults_then_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra_ttl.json");

        let mut registry = NamespaceRegistry::with_defaults();
        assert_eq!(registry.load_or_bootstrap(&path).unwrap(), 10);

        assert!(path.exists());
        assert_eq!(registry.get(MATCH_INFO).unwrap().extra_ttl_secs(), 60);
        assert_eq!(registry.get(TRANSFERS).unwrap().extra_ttl_secs(), 12 * 3600);

        let written: Map<String, Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, default_extra_ttl());
    }

    #[test]
    fn test_bootstrap_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra_ttl.json");
        fs::write(&path, r#"{"MATCH_INFO": 5}"#).unwrap();

        let mut registry = NamespaceRegistry::with_defaults();
        assert_eq!(registry.load_or_bootstrap(&path).unwrap(), 1);
        assert_eq!(registry.get(MATCH_INFO).unwrap().extra_ttl_secs(), 5);
    }

    #[test]
    fn test_bootstrap_fails_when_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("extra_ttl.json");

        let mut registry = NamespaceRegistry::with_defaults();
        assert!(registry.load_or_bootstrap(&path).is_err());
    }
}
