//! Static permission registry.
//!
//! Permissions are opaque `<module>.<action>` strings, case-sensitive,
//! with no wildcard matching. Unknown strings are rejected at the API
//! boundary before they ever reach a role or override record.

use once_cell::sync::Lazy;
use std::collections::BTreeSet;

use crate::error::AuthError;

/// A named group of permissions belonging to one CRM module.
#[derive(Debug, Clone, Copy)]
pub struct PermissionGroup {
    pub module: &'static str,
    pub actions: &'static [&'static str],
}

const CRUD: &[&str] = &["view", "create", "update", "delete"];

/// The full permission catalog, grouped by module.
pub const PERMISSION_GROUPS: &[PermissionGroup] = &[
    PermissionGroup { module: "contacts", actions: CRUD },
    PermissionGroup { module: "companies", actions: CRUD },
    PermissionGroup { module: "deals", actions: CRUD },
    PermissionGroup { module: "pipelines", actions: CRUD },
    PermissionGroup { module: "tags", actions: CRUD },
    PermissionGroup { module: "menus", actions: CRUD },
    PermissionGroup {
        module: "whatsapp",
        actions: &["view", "send", "manage"],
    },
    PermissionGroup {
        module: "reports",
        actions: &["view", "export"],
    },
    PermissionGroup {
        module: "users",
        actions: &["view", "invite", "update", "deactivate"],
    },
    PermissionGroup {
        module: "roles",
        actions: &["view", "manage"],
    },
    PermissionGroup {
        module: "permissions",
        actions: &["manage"],
    },
    PermissionGroup {
        module: "organization",
        actions: &["view", "manage"],
    },
];

static REGISTRY: Lazy<BTreeSet<String>> = Lazy::new(|| {
    PERMISSION_GROUPS
        .iter()
        .flat_map(|group| {
            group
                .actions
                .iter()
                .map(move |action| format!("{}.{}", group.module, action))
        })
        .collect()
});

/// All known permission strings, sorted.
pub fn registry() -> &'static BTreeSet<String> {
    &REGISTRY
}

pub fn is_known(permission: &str) -> bool {
    REGISTRY.contains(permission)
}

/// Reject any permission string that is not in the catalog.
pub fn validate_known(permissions: &[String]) -> Result<(), AuthError> {
    for permission in permissions {
        if !is_known(permission) {
            return Err(AuthError::UnknownPermission(permission.clone()));
        }
    }
    Ok(())
}

/// The resolved permission set of a principal.
///
/// `All` is the sentinel for the system admin role; it short-circuits
/// every membership check without enumerating the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectivePermissions {
    All,
    Set(BTreeSet<String>),
}

impl EffectivePermissions {
    pub fn has(&self, permission: &str) -> bool {
        match self {
            EffectivePermissions::All => true,
            EffectivePermissions::Set(set) => set.contains(permission),
        }
    }

    pub fn has_any(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.has(p))
    }

    pub fn has_all(&self, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.has(p))
    }

    /// Materialize the set for API responses. `All` expands to the
    /// full registry so admin principals see every known permission.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            EffectivePermissions::All => registry().iter().cloned().collect(),
            EffectivePermissions::Set(set) => set.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_expected_entries() {
        assert!(is_known("contacts.create"));
        assert!(is_known("permissions.manage"));
        assert!(is_known("whatsapp.send"));
        assert!(!is_known("contacts.frobnicate"));
        assert!(!is_known("Contacts.Create")); // case-sensitive
    }

    #[test]
    fn no_wildcards_in_registry() {
        assert!(registry().iter().all(|p| !p.contains('*')));
    }

    #[test]
    fn validate_known_rejects_unknown_strings() {
        let ok = vec!["contacts.view".to_string(), "tags.create".to_string()];
        assert!(validate_known(&ok).is_ok());

        let bad = vec!["contacts.view".to_string(), "nope.nope".to_string()];
        let err = validate_known(&bad).unwrap_err();
        assert!(matches!(err, AuthError::UnknownPermission(p) if p == "nope.nope"));
    }

    #[test]
    fn all_sentinel_has_everything() {
        let all = EffectivePermissions::All;
        for permission in registry() {
            assert!(all.has(permission));
        }
        assert_eq!(all.to_vec().len(), registry().len());
    }
}
