//! Permission resolution.
//!
//! Pure set algebra, no I/O: callers supply the role baseline and the
//! principal's override record and get the effective set back.

use std::collections::BTreeSet;

use crate::models::{EffectivePermissions, PermissionOverride};

#[derive(Debug, Clone, Copy)]
pub struct PermissionResolver;

impl PermissionResolver {
    /// Merge a role baseline with a principal's overrides.
    ///
    /// The system admin role short-circuits to the universal set and
    /// ignores overrides entirely. Otherwise the result is
    /// `(base ∪ grant) \ revoke`; revoke is applied last, so a
    /// permission present in both override sets is excluded.
    pub fn resolve(
        base: &[String],
        overrides: &PermissionOverride,
        is_system_admin: bool,
    ) -> EffectivePermissions {
        if is_system_admin {
            return EffectivePermissions::All;
        }

        let mut effective: BTreeSet<String> = base.iter().cloned().collect();
        effective.extend(overrides.grant.iter().cloned());
        for revoked in &overrides.revoke {
            effective.remove(revoked);
        }

        EffectivePermissions::Set(effective)
    }
}
