//! Permission model and evaluator.
//!
//! Grants are per-identity maps from resource category to a set of allowed
//! actions. Categories and actions are closed enums: payloads are parsed at
//! the write boundary, so an invalid pair can never reach storage. An absent
//! grant row, or an absent category within a grant, means deny.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed role set. Stored as TEXT; unknown strings parse to `None` and are
/// never treated as admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "member" => Ok(Role::Member),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Accounts,
    Opportunities,
    Identities,
    Grants,
    Tenants,
}

impl FromStr for ResourceCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accounts" => Ok(ResourceCategory::Accounts),
            "opportunities" => Ok(ResourceCategory::Opportunities),
            "identities" => Ok(ResourceCategory::Identities),
            "grants" => Ok(ResourceCategory::Grants),
            "tenants" => Ok(ResourceCategory::Tenants),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceCategory::Accounts => "accounts",
            ResourceCategory::Opportunities => "opportunities",
            ResourceCategory::Identities => "identities",
            ResourceCategory::Grants => "grants",
            ResourceCategory::Tenants => "tenants",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Approve,
    Admin,
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "edit" => Ok(Action::Edit),
            "delete" => Ok(Action::Delete),
            "approve" => Ok(Action::Approve),
            "admin" => Ok(Action::Admin),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Admin => "admin",
        };
        write!(f, "{}", s)
    }
}

/// Per-identity grant rules: category -> allowed actions.
pub type PermissionRules = BTreeMap<ResourceCategory, BTreeSet<Action>>;

/// Declared statically at each protected route's definition and evaluated
/// before the route body runs.
#[derive(Debug, Clone, Copy)]
pub struct Requirement {
    pub category: ResourceCategory,
    pub actions: &'static [Action],
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[", self.category)?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", action)?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("insufficient permission for {0}")]
    Forbidden(Requirement),

    #[error("identity is not associated with a tenant")]
    TenantRequired,

    #[error("invalid permission: {0}")]
    InvalidPermission(String),
}

/// Decide allow/deny for one requirement.
///
/// The admin role and the configured email allow-list are an explicit bypass;
/// everything else goes through the grant rules with default-deny semantics.
pub fn evaluate(
    role: Option<Role>,
    email: &str,
    rules: Option<&PermissionRules>,
    requirement: &Requirement,
    bypass_emails: &[String],
) -> Result<(), AccessError> {
    if role == Some(Role::Admin) {
        return Ok(());
    }
    if bypass_emails.iter().any(|e| e.eq_ignore_ascii_case(email)) {
        return Ok(());
    }

    let granted = rules
        .and_then(|r| r.get(&requirement.category))
        .ok_or(AccessError::Forbidden(*requirement))?;

    if requirement.actions.iter().all(|a| granted.contains(a)) {
        Ok(())
    } else {
        Err(AccessError::Forbidden(*requirement))
    }
}

/// Parse client-supplied grant rules into the closed enums. Any unknown
/// category or action string rejects the whole payload; nothing is stored.
pub fn parse_rules(payload: &BTreeMap<String, Vec<String>>) -> Result<PermissionRules, AccessError> {
    let mut rules = PermissionRules::new();

    for (category, actions) in payload {
        let category = ResourceCategory::from_str(category)
            .map_err(|_| AccessError::InvalidPermission(format!("unknown category '{}'", category)))?;

        let mut set = BTreeSet::new();
        for action in actions {
            let action = Action::from_str(action)
                .map_err(|_| AccessError::InvalidPermission(format!("unknown action '{}'", action)))?;
            set.insert(action);
        }
        rules.insert(category, set);
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(entries: &[(&str, &[&str])]) -> PermissionRules {
        let payload: BTreeMap<String, Vec<String>> = entries
            .iter()
            .map(|(c, actions)| {
                (c.to_string(), actions.iter().map(|a| a.to_string()).collect())
            })
            .collect();
        parse_rules(&payload).unwrap()
    }

    const VIEW_ACCOUNTS: Requirement = Requirement {
        category: ResourceCategory::Accounts,
        actions: &[Action::View],
    };

    const EDIT_ACCOUNTS: Requirement = Requirement {
        category: ResourceCategory::Accounts,
        actions: &[Action::Edit],
    };

    #[test]
    fn no_grant_row_denies_everything() {
        let err = evaluate(Some(Role::Member), "a@b.co", None, &VIEW_ACCOUNTS, &[]).unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }

    #[test]
    fn admin_role_bypasses_missing_grant() {
        evaluate(Some(Role::Admin), "a@b.co", None, &VIEW_ACCOUNTS, &[]).unwrap();
    }

    #[test]
    fn unknown_role_string_is_not_admin() {
        assert!(Role::from_str("superuser").is_err());
        let err = evaluate(None, "a@b.co", None, &VIEW_ACCOUNTS, &[]).unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }

    #[test]
    fn bypass_email_skips_evaluation() {
        let bypass = vec!["ops@example.com".to_string()];
        evaluate(Some(Role::Member), "OPS@example.com", None, &VIEW_ACCOUNTS, &bypass).unwrap();
    }

    #[test]
    fn granted_action_allows_only_that_action() {
        let r = rules(&[("accounts", &["view"])]);
        evaluate(Some(Role::Member), "a@b.co", Some(&r), &VIEW_ACCOUNTS, &[]).unwrap();

        let err = evaluate(Some(Role::Member), "a@b.co", Some(&r), &EDIT_ACCOUNTS, &[]).unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }

    #[test]
    fn missing_category_behaves_like_empty_set() {
        let r = rules(&[("opportunities", &["view", "edit"])]);
        let err = evaluate(Some(Role::Member), "a@b.co", Some(&r), &VIEW_ACCOUNTS, &[]).unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }

    #[test]
    fn requirement_with_multiple_actions_needs_all_of_them() {
        let r = rules(&[("accounts", &["view", "edit"])]);
        const VIEW_EDIT_DELETE: Requirement = Requirement {
            category: ResourceCategory::Accounts,
            actions: &[Action::View, Action::Edit, Action::Delete],
        };
        let err = evaluate(Some(Role::Member), "a@b.co", Some(&r), &VIEW_EDIT_DELETE, &[]).unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));
    }

    #[test]
    fn unknown_action_string_rejects_whole_payload() {
        let mut payload = BTreeMap::new();
        payload.insert("accounts".to_string(), vec!["view".to_string(), "superuser".to_string()]);

        let err = parse_rules(&payload).unwrap_err();
        assert!(matches!(err, AccessError::InvalidPermission(_)));
    }

    #[test]
    fn unknown_category_rejects_whole_payload() {
        let mut payload = BTreeMap::new();
        payload.insert("warehouses".to_string(), vec!["view".to_string()]);

        let err = parse_rules(&payload).unwrap_err();
        assert!(matches!(err, AccessError::InvalidPermission(_)));
    }

    #[test]
    fn rules_round_trip_through_json() {
        let r = rules(&[("accounts", &["view", "edit"]), ("grants", &["admin"])]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["accounts"], serde_json::json!(["view", "edit"]));

        let back: PermissionRules = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }
}
