//! Role predicates over a [`Principal`].
//!
//! All checks are pure and fail closed: an absent principal or an absent role set grants
//! nothing. Comparison is exact and case-sensitive; "admin" does not imply "clubadmin" or any
//! other label. A role hierarchy, if ever needed, belongs in a separate layer on top of these.

use tracing::debug;

use super::principal::Principal;
use crate::error::{AppError, AppResult};

/// Well-known labels used by the portal.
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const CLUB_ADMIN: &str = "clubadmin";
    pub const REFEREE: &str = "referee";
}

fn role_set(principal: Option<&Principal>) -> Option<&[String]> {
    principal.and_then(|p| p.roles.as_deref())
}

/// True iff every role in `required` is held. An empty `required` is vacuously satisfied as
/// long as the principal and its role set are present.
pub fn has_role(principal: Option<&Principal>, required: &[&str]) -> bool {
    let Some(held) = role_set(principal) else { return false; };
    required.iter().all(|r| held.iter().any(|h| h == r))
}

/// True iff at least one of `candidates` is held. An empty candidate list is never satisfied.
pub fn has_any_role(principal: Option<&Principal>, candidates: &[&str]) -> bool {
    let Some(held) = role_set(principal) else { return false; };
    candidates.iter().any(|c| held.iter().any(|h| h == c))
}

/// Independent copy of the principal's roles, in stored order.
pub fn extract_user_roles(principal: Option<&Principal>) -> Vec<String> {
    role_set(principal).map(|r| r.to_vec()).unwrap_or_default()
}

/// Handler-side adapter: `has_role` turned into a 403 for use with `?`.
pub fn require_role(principal: Option<&Principal>, required: &[&str]) -> AppResult<()> {
    if has_role(principal, required) {
        return Ok(());
    }
    debug!(
        target: "auth",
        user = principal.map(|p| p.user_id.as_str()).unwrap_or("<none>"),
        required = ?required,
        "role check denied"
    );
    Err(AppError::forbidden("missing_role", "insufficient role for this operation"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(roles: &[&str]) -> Principal {
        Principal::new("u1").with_roles(roles.iter().copied())
    }

    #[test]
    fn has_role_is_a_conjunction() {
        let p = with(&["admin", "referee"]);
        assert!(has_role(Some(&p), &["admin"]));
        assert!(has_role(Some(&p), &["admin", "referee"]));
        assert!(!has_role(Some(&p), &["admin", "clubadmin"]));
        assert!(has_role(Some(&p), &[]));
    }

    #[test]
    fn fails_closed_on_absent_principal_or_roles() {
        assert!(!has_role(None, &["admin"]));
        assert!(!has_role(None, &[]));
        assert!(!has_any_role(None, &["admin"]));
        let bare = Principal::new("u2");
        assert!(!has_role(Some(&bare), &["admin"]));
        assert!(!has_role(Some(&bare), &[]));
        assert!(!has_any_role(Some(&bare), &["admin"]));
        assert!(extract_user_roles(Some(&bare)).is_empty());
        assert!(extract_user_roles(None).is_empty());
    }

    #[test]
    fn comparison_is_exact_and_case_sensitive() {
        let p = with(&["admin"]);
        assert!(!has_role(Some(&p), &["Admin"]));
        assert!(!has_any_role(Some(&p), &["ADMIN", "admin "]));
        let club = with(&["clubadmin"]);
        assert!(!has_role(Some(&club), &[roles::ADMIN]));
    }

    #[test]
    fn has_any_role_needs_an_intersection() {
        let p = with(&["referee"]);
        assert!(has_any_role(Some(&p), &["admin", "referee"]));
        assert!(!has_any_role(Some(&p), &["admin", "clubadmin"]));
        assert!(!has_any_role(Some(&p), &[]));
        let empty = with(&[]);
        assert!(!has_any_role(Some(&empty), &["admin"]));
    }

    #[test]
    fn elevation_flags_do_not_grant_roles() {
        let mut p = with(&[]);
        p.is_superuser = true;
        assert!(p.is_elevated());
        assert!(!has_role(Some(&p), &[roles::ADMIN]));
    }

    #[test]
    fn extracted_roles_are_an_independent_copy() {
        let p = with(&["admin", "referee"]);
        let mut copy = extract_user_roles(Some(&p));
        assert_eq!(copy, vec!["admin".to_string(), "referee".to_string()]);
        copy.push("clubadmin".into());
        copy[0] = "nobody".into();
        assert_eq!(p.roles, Some(vec!["admin".to_string(), "referee".to_string()]));
    }

    #[test]
    fn require_role_maps_to_forbidden() {
        let p = with(&["referee"]);
        assert!(require_role(Some(&p), &["referee"]).is_ok());
        let err = require_role(Some(&p), &[roles::ADMIN]).unwrap_err();
        assert_eq!(err.http_status(), 403);
        assert!(require_role(None, &[roles::ADMIN]).is_err());
    }
}
