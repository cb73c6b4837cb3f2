//! Best-effort audit logging.
//!
//! Audit is observability, not a transactional guarantee: writes are
//! spawned off the request path and a failed write is traced locally,
//! never surfaced to the client.

use std::sync::Arc;

use crate::models::AuditLogEntry;
use crate::store::Store;

/// Field names whose values are stripped from `details` before the
/// entry is persisted.
const REDACTED_FIELDS: &[&str] = &["password", "password_hash", "token", "secret", "api_key"];

#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn Store>,
}

impl AuditService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record an entry without blocking the caller.
    pub fn log_async(&self, mut entry: AuditLogEntry) {
        redact(&mut entry.details);
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.insert_audit_log(&entry).await {
                tracing::error!(
                    error = %e,
                    action = %entry.action,
                    "Failed to write audit log entry"
                );
            }
        });
    }
}

/// Replace the values of sensitive keys, recursively, wherever they
/// appear in the details document.
fn redact(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *val = serde_json::Value::String("[REDACTED]".to_string());
                } else {
                    redact(val);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                redact(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_sensitive_fields_at_any_depth() {
        let mut details = json!({
            "email": "agent@example.com",
            "password": "hunter2",
            "nested": {
                "api_key": "sk-12345",
                "note": "kept"
            },
            "items": [{ "token": "abc" }]
        });
        redact(&mut details);

        assert_eq!(details["email"], "agent@example.com");
        assert_eq!(details["password"], "[REDACTED]");
        assert_eq!(details["nested"]["api_key"], "[REDACTED]");
        assert_eq!(details["nested"]["note"], "kept");
        assert_eq!(details["items"][0]["token"], "[REDACTED]");
    }

    #[test]
    fn non_object_details_pass_through() {
        let mut details = json!("reason: invalid_password");
        redact(&mut details);
        assert_eq!(details, json!("reason: invalid_password"));
    }
}
