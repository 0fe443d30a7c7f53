//! CSRF protection: token issuance, timing-safe validation and the request guard.
//!
//! Wire contract: the reference token lives in an HTTP-only, SameSite=Strict cookie and is also
//! returned once in a response body; the client echoes it in a request header on every
//! state-changing request. Safe methods (GET, HEAD, OPTIONS) are never inspected.

mod token;
mod request_context;
mod guard;

pub use token::{generate_csrf_token, validate_csrf_token, CSRF_TOKEN_BYTES, CSRF_TOKEN_HEX_LEN};
pub use request_context::ProtectedRequestContext;
pub use guard::{is_safe_method, check_request, csrf_guard, with_csrf, guard_route, issue_cookie, clear_cookie};
