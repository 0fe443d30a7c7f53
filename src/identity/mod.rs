//! Identity: the principal model, role predicates and the in-process session registry.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod authorizer;

pub use principal::Principal;
pub use session::{Session, SessionId, SessionRegistry};
pub use authorizer::{has_role, has_any_role, extract_user_roles, require_role, roles};
