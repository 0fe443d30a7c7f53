use parking_lot::RwLock;

/// Where the client currently is, and how to hard-navigate elsewhere.
pub trait Location: Send + Sync {
    /// Current path, if the host knows one.
    fn pathname(&self) -> Option<String>;
    /// Replace the current navigational context with `href`.
    fn set_href(&self, href: &str);
}

#[derive(Debug, Default)]
struct State {
    pathname: Option<String>,
    visited: Vec<String>,
}

/// Location kept in memory. Navigating to a path (`/...`) also moves `pathname`, the way a
/// browser would after a full page load.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    state: RwLock<State>,
}

impl MemoryLocation {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self { state: RwLock::new(State { pathname: Some(pathname.into()), visited: Vec::new() }) }
    }

    /// A location with no known path.
    pub fn unknown() -> Self { Self::default() }

    pub fn set_pathname(&self, pathname: impl Into<String>) {
        self.state.write().pathname = Some(pathname.into());
    }

    /// Last navigation target, if any.
    pub fn href(&self) -> Option<String> { self.state.read().visited.last().cloned() }

    /// Every navigation target in order.
    pub fn navigations(&self) -> Vec<String> { self.state.read().visited.clone() }
}

impl Location for MemoryLocation {
    fn pathname(&self) -> Option<String> { self.state.read().pathname.clone() }

    fn set_href(&self, href: &str) {
        let mut st = self.state.write();
        if href.starts_with('/') {
            let path = href.split(['?', '#']).next().unwrap_or(href);
            st.pathname = Some(path.to_string());
        }
        st.visited.push(href.to_string());
    }
}
