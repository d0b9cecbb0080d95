//! Gating mechanisms: route guard, view gate, navigation filter.
//!
//! All three are thin consumers of [`AccessQuery`]; none of them computes
//! permission logic of its own, and none of them returns errors. Absence of
//! permission is a redirect, a hidden region, or a pruned menu entry.

use serde::{Deserialize, Serialize};

use crate::permission::PermissionCode;
use crate::query::AccessQuery;
use crate::state::AccessState;

/// A permission requirement attached to a route, view region or menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "codes")]
pub enum PermissionRequirement {
    /// Satisfied when at least one code is granted.
    Any(Vec<PermissionCode>),
    /// Satisfied when every code is granted.
    All(Vec<PermissionCode>),
}

impl PermissionRequirement {
    pub fn any(codes: impl IntoIterator<Item = PermissionCode>) -> Self {
        Self::Any(codes.into_iter().collect())
    }

    pub fn all(codes: impl IntoIterator<Item = PermissionCode>) -> Self {
        Self::All(codes.into_iter().collect())
    }

    pub fn satisfied_by(&self, query: &AccessQuery<'_>) -> bool {
        match self {
            Self::Any(codes) => query.has_any(codes),
            Self::All(codes) => query.has_all(codes),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route guard
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Navigation proceeds unchanged.
    Allow,
    /// Navigation is blocked; redirect to the contained path.
    Redirect(String),
}

/// A guarded route. A rule with no requirement is public.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub path: String,
    pub requirement: Option<PermissionRequirement>,
}

/// Blocks navigation to routes whose requirement the current state does not
/// satisfy, redirecting to a safe fallback path instead.
///
/// Routes with no registered rule are treated as public: guards attach
/// per-route, and an unguarded route carries no requirement. Unauthenticated
/// state fails closed on every guarded route, since nothing is granted.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    rules: Vec<RouteRule>,
    fallback: String,
}

impl RouteGuard {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.into(),
        }
    }

    pub fn guard(mut self, path: impl Into<String>, requirement: PermissionRequirement) -> Self {
        self.rules.push(RouteRule {
            path: path.into(),
            requirement: Some(requirement),
        });
        self
    }

    pub fn public(mut self, path: impl Into<String>) -> Self {
        self.rules.push(RouteRule {
            path: path.into(),
            requirement: None,
        });
        self
    }

    pub fn check(&self, path: &str, state: &AccessState) -> GuardOutcome {
        let Some(rule) = self.rules.iter().find(|r| r.path == path) else {
            return GuardOutcome::Allow;
        };

        match &rule.requirement {
            None => GuardOutcome::Allow,
            Some(req) if req.satisfied_by(&state.query()) => GuardOutcome::Allow,
            Some(req) => {
                tracing::debug!(path, requirement = ?req, "navigation blocked, redirecting");
                GuardOutcome::Redirect(self.fallback.clone())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View gate
// ─────────────────────────────────────────────────────────────────────────────

/// Conditionally renders a template region.
///
/// The decision is captured once at construction and never re-evaluated, the
/// same one-shot semantics the console's structural directive has: a region
/// gated before resolution completes stays hidden until it is rebuilt.
/// Callers that want reactivity re-evaluate on the resolver's change
/// notification instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewGate {
    visible: bool,
}

impl ViewGate {
    pub fn evaluate(state: &AccessState, requirement: &PermissionRequirement) -> Self {
        Self {
            visible: requirement.satisfied_by(&state.query()),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigation filter
// ─────────────────────────────────────────────────────────────────────────────

/// A leaf menu entry, optionally gated by a single permission code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub label: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionCode>,
}

/// A titled menu section containing leaf entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavSection {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub items: Vec<NavItem>,
}

/// Prune a menu tree to what the current state may see.
///
/// Items whose permission is absent are always visible; items whose
/// permission is not granted are dropped; sections left with zero visible
/// items are dropped entirely. Administrators bypass filtering and get the
/// tree back unpruned.
pub fn filter_nav(sections: &[NavSection], state: &AccessState) -> Vec<NavSection> {
    let query = state.query();
    if query.is_admin() {
        return sections.to_vec();
    }

    sections
        .iter()
        .filter_map(|section| {
            let items: Vec<NavItem> = section
                .items
                .iter()
                .filter(|item| match &item.permission {
                    None => true,
                    Some(code) => query.has(code),
                })
                .cloned()
                .collect();

            if items.is_empty() {
                None
            } else {
                Some(NavSection {
                    label: section.label.clone(),
                    icon: section.icon.clone(),
                    items,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;
    use crate::role::Role;
    use merchdesk_core::{PermissionId, RoleId, StoreId};

    fn perm(code: &'static str) -> Permission {
        Permission {
            id: PermissionId::new(),
            code: PermissionCode::new(code),
            name: code.to_string(),
            description: None,
            module: "erp".to_string(),
            group: "Orders".to_string(),
            is_active: true,
        }
    }

    fn state_with(permissions: Vec<Permission>, administrative: bool) -> AccessState {
        AccessState::from_role(Role {
            id: RoleId::new(),
            name: "Role".to_string(),
            description: None,
            permissions,
            is_administrative: administrative,
            store_id: (!administrative).then(StoreId::new),
            is_default: false,
            is_active: true,
        })
    }

    fn code(c: &'static str) -> PermissionCode {
        PermissionCode::new(c)
    }

    #[test]
    fn guard_allows_when_requirement_met() {
        let guard = RouteGuard::new("/dashboard")
            .guard("/orders", PermissionRequirement::any([code("erp.orders.view")]));

        let state = state_with(vec![perm("erp.orders.view")], false);
        assert_eq!(guard.check("/orders", &state), GuardOutcome::Allow);
    }

    #[test]
    fn guard_redirects_when_requirement_fails() {
        let guard = RouteGuard::new("/dashboard")
            .guard("/orders", PermissionRequirement::all([code("erp.orders.view"), code("erp.orders.edit")]));

        let state = state_with(vec![perm("erp.orders.view")], false);
        assert_eq!(
            guard.check("/orders", &state),
            GuardOutcome::Redirect("/dashboard".to_string())
        );
    }

    #[test]
    fn guard_fails_closed_when_unauthenticated() {
        let guard = RouteGuard::new("/login")
            .guard("/orders", PermissionRequirement::any([code("erp.orders.view")]));

        assert_eq!(
            guard.check("/orders", &AccessState::anonymous()),
            GuardOutcome::Redirect("/login".to_string())
        );
    }

    #[test]
    fn unguarded_and_public_routes_allow() {
        let guard = RouteGuard::new("/login").public("/about");

        let state = AccessState::anonymous();
        assert_eq!(guard.check("/about", &state), GuardOutcome::Allow);
        assert_eq!(guard.check("/unregistered", &state), GuardOutcome::Allow);
    }

    #[test]
    fn view_gate_captures_decision_once() {
        let requirement = PermissionRequirement::any([code("erp.orders.view")]);

        let denied = ViewGate::evaluate(&AccessState::anonymous(), &requirement);
        assert!(!denied.is_visible());

        // A later state change does not affect an already-built gate.
        let state = state_with(vec![perm("erp.orders.view")], false);
        assert!(!denied.is_visible());
        assert!(ViewGate::evaluate(&state, &requirement).is_visible());
    }

    fn reports_tree() -> Vec<NavSection> {
        vec![NavSection {
            label: "Reports".to_string(),
            icon: None,
            items: vec![NavItem {
                label: "Sales".to_string(),
                link: "a".to_string(),
                permission: Some(code("x")),
            }],
        }]
    }

    #[test]
    fn section_dropped_when_no_visible_children() {
        let state = state_with(vec![perm("erp.orders.view")], false);
        assert!(filter_nav(&reports_tree(), &state).is_empty());
    }

    #[test]
    fn admin_sees_unpruned_tree() {
        let state = state_with(vec![], true);
        assert_eq!(filter_nav(&reports_tree(), &state), reports_tree());
    }

    #[test]
    fn ungated_items_survive_and_gated_items_prune() {
        let sections = vec![NavSection {
            label: "Operations".to_string(),
            icon: Some("gear".to_string()),
            items: vec![
                NavItem {
                    label: "Home".to_string(),
                    link: "/home".to_string(),
                    permission: None,
                },
                NavItem {
                    label: "Orders".to_string(),
                    link: "/orders".to_string(),
                    permission: Some(code("erp.orders.view")),
                },
                NavItem {
                    label: "Suppliers".to_string(),
                    link: "/suppliers".to_string(),
                    permission: Some(code("erp.suppliers.view")),
                },
            ],
        }];

        let state = state_with(vec![perm("erp.orders.view")], false);
        let filtered = filter_nav(&sections, &state);

        assert_eq!(filtered.len(), 1);
        let labels: Vec<&str> = filtered[0].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "Orders"]);
    }
}
