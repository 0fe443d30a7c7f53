//! Client side of the session: artifact storage, location, the session terminator and an HTTP
//! client that speaks the portal's CSRF contract.

mod storage;
mod location;
mod terminator;
pub mod http;

pub use storage::{SessionStorage, MemoryStorage, JsonFileStorage, StorageError, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, CSRF_TOKEN_KEY};
pub use location::{Location, MemoryLocation};
pub use terminator::{
    terminate, terminate_session, handle_auth_failure, ambient_storage, ambient_location,
    install_ambient_storage, install_ambient_location, SESSION_ARTIFACT_KEYS, LOGIN_PATH,
};
pub use http::PortalClient;
