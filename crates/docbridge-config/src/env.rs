//! Environment variable fallback and `${VAR}` reference resolution.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set.

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `DOCBRIDGE_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "DOCBRIDGE_STORAGE_BACKEND",
        field_path: "storage.backend",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_NATIVE_ENDPOINT",
        field_path: "storage.native.endpoint",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_NATIVE_TIMEOUT_SECS",
        field_path: "storage.native.timeout_secs",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_TABLE_ENGINE",
        field_path: "storage.table.engine",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_TABLE_PATH",
        field_path: "storage.table.path",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_SEARCH_ENDPOINT",
        field_path: "storage.remote_search.endpoint",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_SEARCH_TIMEOUT_SECS",
        field_path: "storage.remote_search.timeout_secs",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_LOG_FORMAT",
        field_path: "logging.format",
    },
    EnvMapping {
        var_name: "DOCBRIDGE_LOG_FILE",
        field_path: "logging.file",
    },
];

/// Apply environment variable fallbacks to fields that were **not** set by
/// any config file layer. Fields still at their embedded default count as
/// unset.
///
/// Returns the number of env vars applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric field receives a value that
/// is not an integer.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults)
        {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            let toml_val = coerce_to_toml_value(mapping, val)?;
            set_field(merged, mapping.field_path, toml_val);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    Ok(count)
}

/// Resolve `${VAR}` references within string values in the config tree.
///
/// References that don't resolve are left as-is.
pub fn resolve_env_references<S: ::std::hash::BuildHasher>(
    val: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) {
    match val {
        toml::Value::String(s) => {
            *s = resolve_string_refs(s, env_vars);
        },
        toml::Value::Table(table) => {
            for (_, child) in table.iter_mut() {
                resolve_env_references(child, env_vars);
            }
        },
        toml::Value::Array(arr) => {
            for child in arr.iter_mut() {
                resolve_env_references(child, env_vars);
            }
        },
        _ => {},
    }
}

/// Replace `${VAR}` references in a string with their env var values.
fn resolve_string_refs<S: ::std::hash::BuildHasher>(
    input: &str,
    env_vars: &HashMap<String, String, S>,
) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;

            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }

            if closed && !var_name.is_empty() {
                if let Some(val) = env_vars.get(&var_name) {
                    result.push_str(val);
                } else {
                    debug!(var = var_name, "unresolved env var reference in config");
                    let _ = write!(result, "${{{var_name}}}");
                }
            } else {
                // Malformed reference, leave as-is.
                result.push_str("${");
                result.push_str(&var_name);
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Set a dotted field path in the TOML tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, val: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), val);
    }
}

/// Coerce a string env var value to the TOML type its field expects.
fn coerce_to_toml_value(mapping: &EnvMapping, val: &str) -> ConfigResult<toml::Value> {
    if mapping.field_path.ends_with("timeout_secs") {
        return val
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected an integer: {e}"),
            });
    }
    Ok(toml::Value::String(val.to_owned()))
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_fallbacks() {
        let mut merged: toml::Value = toml::from_str("[storage]\nbackend = \"native\"").unwrap();
        let mut sources = FieldSources::new();
        let env = make_env(&[
            ("DOCBRIDGE_SEARCH_ENDPOINT", "http://search:9200"),
            ("DOCBRIDGE_LOG_LEVEL", "debug"),
        ]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            merged["storage"]["remote_search"]["endpoint"]
                .as_str()
                .unwrap(),
            "http://search:9200"
        );
        assert_eq!(merged["logging"]["level"].as_str().unwrap(), "debug");
        assert_eq!(
            sources.get("logging.level"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_fallback_replaces_defaults() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::Defaults);

        let env = make_env(&[("DOCBRIDGE_LOG_LEVEL", "trace")]);
        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 1);
        assert_eq!(merged["logging"]["level"].as_str().unwrap(), "trace");
    }

    #[test]
    fn test_env_fallback_skips_file_values() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);

        let env = make_env(&[("DOCBRIDGE_LOG_LEVEL", "debug")]);
        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str().unwrap(), "warn");
    }

    #[test]
    fn test_timeout_coerced_to_integer() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("DOCBRIDGE_NATIVE_TIMEOUT_SECS", "5")]);

        apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();
        assert_eq!(
            merged["storage"]["native"]["timeout_secs"]
                .as_integer()
                .unwrap(),
            5
        );
    }

    #[test]
    fn test_non_numeric_timeout_rejected() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("DOCBRIDGE_SEARCH_TIMEOUT_SECS", "soon")]);

        let err = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvError { ref var_name, .. } if var_name == "DOCBRIDGE_SEARCH_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_resolve_env_references() {
        let mut val: toml::Value =
            toml::from_str("[storage.native]\nendpoint = \"http://${ES_HOST}:9200\"").unwrap();
        let env = make_env(&[("ES_HOST", "es.internal")]);
        resolve_env_references(&mut val, &env);

        assert_eq!(
            val["storage"]["native"]["endpoint"].as_str().unwrap(),
            "http://es.internal:9200"
        );
    }

    #[test]
    fn test_resolve_env_references_unresolved() {
        let mut val: toml::Value =
            toml::from_str("[storage.table]\npath = \"${MISSING_VAR}/data\"").unwrap();
        resolve_env_references(&mut val, &HashMap::new());

        assert_eq!(
            val["storage"]["table"]["path"].as_str().unwrap(),
            "${MISSING_VAR}/data"
        );
    }

    #[test]
    fn test_resolve_malformed_reference_left_alone() {
        let env = make_env(&[("A", "x")]);
        assert_eq!(resolve_string_refs("${A", &env), "${A");
        assert_eq!(resolve_string_refs("$A", &env), "$A");
    }
}
