use std::sync::Arc;

use axum::extract::{Request, State};
use axum::handler::Handler;
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};
use tracing::{debug, warn};

use super::request_context::ProtectedRequestContext;
use super::token::validate_csrf_token;
use crate::config::CsrfConfig;
use crate::cookies;
use crate::error::{AppError, AppResult};

/// GET, HEAD and OPTIONS pass through the guard uninspected; every other method,
/// including ones we do not recognise, must carry a valid token.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// The guard's decision for one request, with no side effects beyond logging.
pub fn check_request(ctx: &ProtectedRequestContext<'_>, config: &CsrfConfig) -> AppResult<()> {
    if is_safe_method(ctx.method()) {
        return Ok(());
    }
    let submitted = ctx.submitted_token(config);
    let reference = ctx.reference_token(config);
    if validate_csrf_token(submitted.unwrap_or_default(), reference.unwrap_or_default()) {
        debug!(target: "csrf", method = %ctx.method(), "csrf token accepted");
        return Ok(());
    }
    // never log the token values themselves
    warn!(
        target: "csrf",
        method = %ctx.method(),
        header_present = submitted.is_some(),
        cookie_present = reference.is_some(),
        "csrf validation failed"
    );
    Err(AppError::csrf_denied())
}

/// Middleware form of the guard, for `middleware::from_fn_with_state`.
///
/// On success the request is forwarded untouched and the inner response is returned as is;
/// on failure the inner service is never called.
pub async fn csrf_guard(State(config): State<Arc<CsrfConfig>>, req: Request, next: Next) -> Response {
    let verdict = {
        let ctx = ProtectedRequestContext::new(req.method(), req.headers());
        check_request(&ctx, &config)
    };
    match verdict {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

/// Wrap an existing method router so every method it serves is CSRF-checked.
pub fn guard_route<S>(route: MethodRouter<S>, config: CsrfConfig) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.layer(middleware::from_fn_with_state(Arc::new(config), csrf_guard))
}

/// Decorate an arbitrary handler: it answers every method, and state-changing methods only
/// reach it with a matching header/cookie token pair.
///
/// ```ignore
/// let app: Router = Router::new().route("/api/fixtures", with_csrf(save_fixture, CsrfConfig::default()));
/// ```
pub fn with_csrf<H, T, S>(handler: H, config: CsrfConfig) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    guard_route(any(handler), config)
}

/// `Set-Cookie` value delivering a reference token.
pub fn issue_cookie(token: &str, config: &CsrfConfig) -> AppResult<HeaderValue> {
    cookies::build_cookie(&config.cookie_name, token, config.max_age_secs, config.secure_cookie)
}

/// `Set-Cookie` value that expires the reference token.
pub fn clear_cookie(config: &CsrfConfig) -> AppResult<HeaderValue> {
    cookies::expired_cookie(&config.cookie_name, config.secure_cookie)
}
