//! Roles and access control
//!
//! Mutation entry points consult an `AccessControl` implementation; read
//! paths never do.

use kresko_core::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum_macros::{Display, EnumString};
use tracing::info;

/// Protocol roles
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Protocol parameters and rebases
    Admin,

    /// Asset listing and configuration
    Operator,
}

/// Role lookup consumed by the protocol
pub trait AccessControl: Send + Sync {
    fn has_role(&self, account: &AccountId, role: Role) -> bool;
}

/// In-memory role assignments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    members: BTreeMap<Role, BTreeSet<AccountId>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a role; returns false if the account already had it
    pub fn grant(&mut self, role: Role, account: AccountId) -> bool {
        info!(role = %role, account = %account, "Role granted");
        self.members.entry(role).or_default().insert(account)
    }

    /// Revoke a role; returns false if the account did not have it
    pub fn revoke(&mut self, role: Role, account: &AccountId) -> bool {
        info!(role = %role, account = %account, "Role revoked");
        self.members
            .get_mut(&role)
            .map(|set| set.remove(account))
            .unwrap_or(false)
    }

    pub fn with_role(mut self, role: Role, account: AccountId) -> Self {
        self.grant(role, account);
        self
    }

    pub fn members(&self, role: Role) -> impl Iterator<Item = &AccountId> {
        self.members.get(&role).into_iter().flatten()
    }
}

impl AccessControl for RoleRegistry {
    fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(account))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Operator.to_string(), "operator");
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_grant_and_revoke() {
        let alice = AccountId::from("alice");
        let mut roles = RoleRegistry::new();

        assert!(!roles.has_role(&alice, Role::Admin));
        assert!(roles.grant(Role::Admin, alice.clone()));
        assert!(!roles.grant(Role::Admin, alice.clone()));
        assert!(roles.has_role(&alice, Role::Admin));
        assert!(!roles.has_role(&alice, Role::Operator));

        assert!(roles.revoke(Role::Admin, &alice));
        assert!(!roles.has_role(&alice, Role::Admin));
        assert!(!roles.revoke(Role::Admin, &alice));
    }

    #[test]
    fn test_members_and_serde() {
        let roles = RoleRegistry::new()
            .with_role(Role::Operator, AccountId::from("ops"))
            .with_role(Role::Operator, AccountId::from("bot"));
        assert_eq!(roles.members(Role::Operator).count(), 2);
        assert_eq!(roles.members(Role::Admin).count(), 0);

        let json = serde_json::to_string(&roles).unwrap();
        assert!(json.contains("\"operator\""));
        let parsed: RoleRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, roles);
    }
}
