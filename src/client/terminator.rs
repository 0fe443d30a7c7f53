//! Return the client to an unauthenticated state after an authentication failure.

use once_cell::sync::{Lazy, OnceCell};
use tracing::{debug, info};

use super::location::{Location, MemoryLocation};
use super::storage::{MemoryStorage, SessionStorage, StorageError, ACCESS_TOKEN_KEY, CSRF_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Artifacts removed on termination, in removal order.
pub const SESSION_ARTIFACT_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, CSRF_TOKEN_KEY];

pub const LOGIN_PATH: &str = "/login";

static AMBIENT_STORAGE: OnceCell<Box<dyn SessionStorage>> = OnceCell::new();
static AMBIENT_LOCATION: OnceCell<Box<dyn Location>> = OnceCell::new();
static FALLBACK_STORAGE: Lazy<MemoryStorage> = Lazy::new(MemoryStorage::new);
static FALLBACK_LOCATION: Lazy<MemoryLocation> = Lazy::new(MemoryLocation::unknown);

/// Install the process-wide storage. Only the outermost call site (a binary's `main`) should do
/// this; returns false if one was already installed.
pub fn install_ambient_storage(storage: Box<dyn SessionStorage>) -> bool {
    AMBIENT_STORAGE.set(storage).is_ok()
}

pub fn install_ambient_location(location: Box<dyn Location>) -> bool {
    AMBIENT_LOCATION.set(location).is_ok()
}

/// The installed process-wide storage, or an in-memory one if none was installed.
pub fn ambient_storage() -> &'static dyn SessionStorage {
    match AMBIENT_STORAGE.get() {
        Some(s) => s.as_ref(),
        None => &*FALLBACK_STORAGE,
    }
}

pub fn ambient_location() -> &'static dyn Location {
    match AMBIENT_LOCATION.get() {
        Some(l) => l.as_ref(),
        None => &*FALLBACK_LOCATION,
    }
}

fn is_login_path(pathname: Option<&str>) -> bool {
    pathname.map(|p| p.contains(LOGIN_PATH)).unwrap_or(false)
}

/// Clear the session artifacts, then hard-redirect to `/login` unless already on a login page.
///
/// All three removals complete before the path is looked at. Missing keys and an unknown or
/// empty path are normal; only a failing storage backend produces an error, in which case no
/// navigation happens. Calling this again on a cleared, redirected client changes nothing.
pub fn terminate<L, S>(location: &L, storage: &S) -> Result<(), StorageError>
where
    L: Location + ?Sized,
    S: SessionStorage + ?Sized,
{
    for key in SESSION_ARTIFACT_KEYS {
        storage.remove(key)?;
    }
    let pathname = location.pathname();
    if is_login_path(pathname.as_deref()) {
        debug!(target: "session", "session artifacts cleared; already on login page");
        return Ok(());
    }
    info!(target: "session", from = pathname.as_deref().unwrap_or(""), "session terminated; redirecting to login");
    location.set_href(LOGIN_PATH);
    Ok(())
}

/// [`terminate`] against the ambient location and storage.
pub fn terminate_session() -> Result<(), StorageError> {
    terminate(ambient_location(), ambient_storage())
}

/// Terminate the session if `status` says the caller is unauthenticated (401).
/// Returns whether termination ran.
pub fn handle_auth_failure<L, S>(status: u16, location: &L, storage: &S) -> Result<bool, StorageError>
where
    L: Location + ?Sized,
    S: SessionStorage + ?Sized,
{
    if status != 401 {
        return Ok(false);
    }
    terminate(location, storage)?;
    Ok(true)
}
