use crate::services::auth::{
    claims::{Permission, TokenClaims},
    error::AuthError,
};

/// Checks a verified token's `permissions` claim against the permission an
/// operation requires.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionAuthorizer;

impl PermissionAuthorizer {
    /// Returns the claims unchanged on success so calls can be chained.
    pub fn authorize(
        &self,
        claims: TokenClaims,
        required: &Permission,
    ) -> Result<TokenClaims, AuthError> {
        let granted = claims
            .permissions()
            .ok_or(AuthError::PermissionsClaimMissing)?;

        if !granted.contains(required.as_str()) {
            return Err(AuthError::InsufficientPermission);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::services::auth::{
        key_set::KeySet,
        testutil::{SUBJECT, TestKey, valid_claims, verifier},
    };

    fn verified(permissions: Option<&[&str]>) -> TokenClaims {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let key = TestKey::new("k1", 1);
        let mut claims = valid_claims(permissions.unwrap_or_default(), now);
        if permissions.is_none() {
            claims.as_object_mut().unwrap().remove("permissions");
        }
        verifier()
            .verify_at(&key.sign(&claims), &KeySet::from_records([key.record()]), now)
            .unwrap()
    }

    #[test]
    fn granted_permission_passes_claims_through() {
        let claims = verified(Some(&["add:movie", "view:movies"]));
        let authorized = PermissionAuthorizer
            .authorize(claims.clone(), &Permission::from("view:movies"))
            .unwrap();

        assert_eq!(authorized, claims);
        assert_eq!(authorized.subject(), SUBJECT);
    }

    #[test]
    fn missing_permission_is_insufficient() {
        let claims = verified(Some(&["view:movies"]));
        assert_eq!(
            PermissionAuthorizer.authorize(claims, &Permission::from("add:movie")),
            Err(AuthError::InsufficientPermission)
        );
    }

    #[test]
    fn empty_permission_set_is_insufficient() {
        let claims = verified(Some(&[]));
        assert_eq!(
            PermissionAuthorizer.authorize(claims, &Permission::from("view:movies")),
            Err(AuthError::InsufficientPermission)
        );
    }

    #[test]
    fn absent_permissions_claim_is_reported_separately() {
        let claims = verified(None);
        assert_eq!(
            PermissionAuthorizer.authorize(claims, &Permission::from("view:movies")),
            Err(AuthError::PermissionsClaimMissing)
        );
    }

    #[test]
    fn no_wildcard_or_prefix_matching() {
        let claims = verified(Some(&["view:*", "view", "view:movies:all", "VIEW:MOVIES"]));
        assert_eq!(
            PermissionAuthorizer.authorize(claims, &Permission::from("view:movies")),
            Err(AuthError::InsufficientPermission)
        );
    }
}
