use crate::permission::PermissionCode;
use crate::state::AccessState;

/// Permission query surface over an [`AccessState`].
///
/// This is the sole authority consulted by every gating mechanism; guards,
/// view gates and the navigation filter never compute permission logic
/// themselves. All reads are pure and never panic: the unauthenticated state
/// simply denies everything.
///
/// The administrative short-circuit lives here (rather than in each
/// consumer) so a bypass cannot be forgotten at one call site. The one
/// exception is an empty `has_any` requirement, which denies even for
/// administrators: requiring "any of nothing" is a caller bug and must not
/// silently widen into "always allow".
#[derive(Debug, Clone, Copy)]
pub struct AccessQuery<'a> {
    state: &'a AccessState,
}

impl<'a> AccessQuery<'a> {
    pub(crate) fn new(state: &'a AccessState) -> Self {
        Self { state }
    }

    /// Whether the current role bypasses per-permission checks entirely.
    pub fn is_admin(&self) -> bool {
        self.state.is_admin()
    }

    /// True iff `code` is granted.
    pub fn has(&self, code: &PermissionCode) -> bool {
        self.is_admin() || self.state.permission_set().contains(code)
    }

    /// True iff at least one of `codes` is granted. Empty input denies.
    pub fn has_any(&self, codes: &[PermissionCode]) -> bool {
        if codes.is_empty() {
            return false;
        }
        self.is_admin() || codes.iter().any(|c| self.state.permission_set().contains(c))
    }

    /// True iff every code in `codes` is granted. Empty input is vacuously
    /// true.
    pub fn has_all(&self, codes: &[PermissionCode]) -> bool {
        self.is_admin() || codes.iter().all(|c| self.state.permission_set().contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;
    use crate::role::Role;
    use merchdesk_core::{PermissionId, RoleId, StoreId};
    use proptest::prelude::*;

    fn perm(code: &str, active: bool) -> Permission {
        Permission {
            id: PermissionId::new(),
            code: PermissionCode::new(code.to_string()),
            name: code.to_string(),
            description: None,
            module: "erp".to_string(),
            group: "Orders".to_string(),
            is_active: active,
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

    fn code(c: &str) -> PermissionCode {
        PermissionCode::new(c.to_string())
    }

    #[test]
    fn has_checks_membership() {
        let state = state_with(vec![perm("erp.orders.view", true)], false);
        let q = state.query();

        assert!(q.has(&code("erp.orders.view")));
        assert!(!q.has(&code("erp.orders.edit")));
    }

    #[test]
    fn inactive_permission_denied() {
        let state = state_with(vec![perm("erp.orders.view", false)], false);
        assert!(!state.query().has(&code("erp.orders.view")));
    }

    #[test]
    fn any_and_all_combinators() {
        let state = state_with(
            vec![perm("erp.orders.view", true), perm("erp.orders.edit", true)],
            false,
        );
        let q = state.query();

        assert!(q.has_any(&[code("erp.orders.view"), code("erp.suppliers.view")]));
        assert!(!q.has_any(&[code("erp.suppliers.view")]));
        assert!(q.has_all(&[code("erp.orders.view"), code("erp.orders.edit")]));
        assert!(!q.has_all(&[code("erp.orders.view"), code("erp.suppliers.view")]));
    }

    #[test]
    fn empty_inputs_differ() {
        let state = state_with(vec![perm("erp.orders.view", true)], false);
        let q = state.query();

        assert!(!q.has_any(&[]));
        assert!(q.has_all(&[]));
    }

    #[test]
    fn empty_has_any_denies_even_admins() {
        let state = state_with(vec![], true);
        assert!(!state.query().has_any(&[]));
    }

    #[test]
    fn unauthenticated_denies_everything() {
        let state = AccessState::anonymous();
        let q = state.query();

        assert!(!q.is_admin());
        assert!(!q.has(&code("erp.orders.view")));
        assert!(!q.has_any(&[code("erp.orders.view")]));
        assert!(!q.has_all(&[code("erp.orders.view")]));
    }

    proptest! {
        #[test]
        fn ungranted_code_always_denied(c in "[a-z]{1,10}\\.[a-z]{1,10}\\.[a-z]{1,10}") {
            prop_assume!(c != "erp.orders.view");

            let state = state_with(vec![perm("erp.orders.view", true)], false);
            prop_assert!(!state.query().has(&code(&c)));
        }

        #[test]
        fn admin_grants_any_nonempty_requirement(
            codes in proptest::collection::vec("[a-z]{1,10}(\\.[a-z]{1,10}){0,2}", 1..6)
        ) {
            let state = state_with(vec![], true);
            let codes: Vec<PermissionCode> = codes.iter().map(|c| code(c)).collect();

            prop_assert!(state.query().has_any(&codes));
            prop_assert!(state.query().has_all(&codes));
        }
    }
}
