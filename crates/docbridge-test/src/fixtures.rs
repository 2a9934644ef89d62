//! Sample documents and identifiers.

use serde_json::{Value, json};

/// Collection used by default in tests.
#[must_use]
pub fn test_collection() -> &'static str {
    ".plugins-ml-connector"
}

/// Tenant used by default in tests.
#[must_use]
pub fn test_tenant() -> &'static str {
    "tenant-a"
}

/// A fresh document id.
#[must_use]
pub fn unique_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A connector-shaped document: nested objects, arrays of mixed types,
/// integers, floats, booleans, nulls and empty containers.
#[must_use]
pub fn sample_connector() -> Value {
    json!({
        "name": "remote-embedding",
        "version": 1,
        "protocol": "http",
        "parameters": {
            "endpoint": "api.example.com",
            "model": "text-embedding",
            "temperature": 0.25,
            "max_tokens": 4096
        },
        "credential": {
            "key": "sealed"
        },
        "actions": [
            {
                "action_type": "predict",
                "method": "POST",
                "headers": {"content-type": "application/json"},
                "request_body": "{ \"input\": ${parameters.input} }"
            }
        ],
        "backend_roles": ["ml", "admin"],
        "mixed": [1, "two", true, null, {"three": 3.5}],
        "owner": null,
        "enabled": true,
        "tags": [],
        "metadata": {}
    })
}

/// A small document with only top-level scalars.
#[must_use]
pub fn sample_model_group() -> Value {
    json!({
        "name": "embeddings",
        "latest_version": 3,
        "description": "Shared embedding models",
        "access": "public"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_objects() {
        assert!(sample_connector().is_object());
        assert!(sample_model_group().is_object());
    }

    #[test]
    fn test_unique_ids_differ() {
        assert_ne!(unique_id(), unique_id());
    }
}
