//! Role gate: the capability checks every operation is preconditioned on.

use crate::error::{AuthzError, Result};
use crate::types::{Principal, PrincipalId, Role};

/// Fails with `Unauthenticated` unless the principal is a persisted identity.
pub fn require_authenticated(principal: &Principal) -> Result<PrincipalId> {
    match (principal.role(), principal.id()) {
        (Role::Anonymous, _) => Err(AuthzError::Unauthenticated),
        (Role::Admin | Role::Super, Some(id)) => Ok(id),
        (Role::Admin | Role::Super, None) => Err(AuthzError::Unauthenticated),
    }
}

/// Fails with `Unauthenticated` if anonymous, `Forbidden` unless Super.
pub fn require_super(principal: &Principal) -> Result<PrincipalId> {
    let id = require_authenticated(principal)?;
    match principal.role() {
        Role::Super => Ok(id),
        Role::Admin | Role::Anonymous => Err(AuthzError::Forbidden),
    }
}

/// Gate for category and product management.
///
/// Any authenticated principal may write; there is no per-category write
/// scoping, only read scoping.
pub fn require_catalog_writer(principal: &Principal) -> Result<PrincipalId> {
    match principal.role() {
        Role::Admin | Role::Super => require_authenticated(principal),
        Role::Anonymous => Err(AuthzError::Unauthenticated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Principal::anonymous(), false, false)]
    #[case(Principal::admin(2), true, false)]
    #[case(Principal::super_admin(1), true, true)]
    fn test_gate_matrix(
        #[case] principal: Principal,
        #[case] authenticated: bool,
        #[case] is_super: bool,
    ) {
        assert_eq!(require_authenticated(&principal).is_ok(), authenticated);
        assert_eq!(require_catalog_writer(&principal).is_ok(), authenticated);
        assert_eq!(require_super(&principal).is_ok(), is_super);
    }

    #[test]
    fn test_require_super_error_kinds() {
        assert!(matches!(
            require_super(&Principal::anonymous()),
            Err(AuthzError::Unauthenticated)
        ));
        assert!(matches!(
            require_super(&Principal::admin(2)),
            Err(AuthzError::Forbidden)
        ));
        assert_eq!(require_super(&Principal::super_admin(1)).unwrap(), 1);
    }
}
