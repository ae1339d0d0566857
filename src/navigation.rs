// Navigation collaborator
// The client never touches routing directly, it asks this trait

use std::sync::Mutex;

/// Current location, path plus query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path component, starts with '/'
    pub path: String,

    /// Query string including the leading '?', or empty
    pub query: String,
}

impl Location {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }
}

/// Client-side navigation collaborator
///
/// `current_location` returning `None` means no UI context is attached, in
/// which case the client skips the redirect-on-auth-failure side effect.
pub trait Navigator: Send + Sync {
    fn current_location(&self) -> Option<Location>;

    /// Perform a client-side redirect to the given route
    fn push(&self, route: &str);
}

/// Navigator for headless contexts, never redirects
#[derive(Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_location(&self) -> Option<Location> {
        None
    }

    fn push(&self, _route: &str) {}
}

/// Test double recording every pushed route
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    location: Option<Location>,
    pushed: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// Create a navigator reporting the given current location
    pub fn at(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            location: Some(Location::new(path, query)),
            pushed: Mutex::new(Vec::new()),
        }
    }

    /// Routes pushed so far, in order
    pub fn pushed(&self) -> Vec<String> {
        self.pushed.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> Option<Location> {
        self.location.clone()
    }

    fn push(&self, route: &str) {
        if let Ok(mut pushed) = self.pushed.lock() {
            pushed.push(route.to_string());
        }
    }
}

/// Build the login route carrying the original location as redirect target
pub fn login_redirect_target(login_route: &str, location: &Location) -> String {
    format!(
        "{}?redirect={}{}",
        login_route, location.path, location.query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_redirect_target_with_query() {
        let location = Location::new("/orders", "?page=2&sort=date");
        assert_eq!(
            login_redirect_target("/login", &location),
            "/login?redirect=/orders?page=2&sort=date"
        );
    }

    #[test]
    fn test_redirect_target_without_query() {
        let location = Location::new("/orders", "");
        assert_eq!(
            login_redirect_target("/login", &location),
            "/login?redirect=/orders"
        );
    }

    #[test]
    fn test_recording_navigator_records_in_order() {
        let navigator = RecordingNavigator::at("/orders", "");
        navigator.push("/login?redirect=/orders");
        navigator.push("/login?redirect=/orders");
        assert_eq!(navigator.pushed().len(), 2);
        assert_eq!(
            navigator.current_location(),
            Some(Location::new("/orders", ""))
        );
    }

    #[test]
    fn test_noop_navigator_has_no_location() {
        let navigator = NoopNavigator;
        assert_eq!(navigator.current_location(), None);
    }

    proptest! {
        // The original path and query must come through verbatim so the
        // login flow can send the user back where they were.
        #[test]
        fn prop_target_preserves_location(
            path in "/[a-z0-9/-]{0,30}",
            query in "(\\?[a-z0-9=&]{1,30})?",
        ) {
            let location = Location::new(path.clone(), query.clone());
            let target = login_redirect_target("/login", &location);
            prop_assert!(target.starts_with("/login?redirect="));
            prop_assert_eq!(target, format!("/login?redirect={}{}", path, query));
        }
    }
}
