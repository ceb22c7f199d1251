//! Access policy: what a navigation request should do given the
//! current session state.
//!
//! Consumers deny unauthenticated access by bouncing to the sign-in
//! view with the original path preserved for the post-login redirect,
//! and deny publisher-only views to respondents without leaving the
//! app.

use crate::session::SessionManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Not signed in: go to the sign-in view, carrying the
    /// percent-encoded original path.
    RedirectToSignIn { redirect_to: String },
    /// Signed in but lacking the publisher role: back to home.
    RedirectHome,
}

impl AccessDecision {
    /// Path the front end should navigate to, `None` when access is
    /// granted.
    pub fn redirect_target(&self) -> Option<String> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectToSignIn { redirect_to } => {
                Some(format!("/sign-in?redirectTo={}", redirect_to))
            }
            AccessDecision::RedirectHome => Some("/".to_string()),
        }
    }
}

/// Gate a request for `path` against the current session.
pub fn check_access(
    manager: &SessionManager,
    path: &str,
    require_publisher: bool,
) -> AccessDecision {
    if !manager.is_authenticated() {
        return AccessDecision::RedirectToSignIn {
            redirect_to: urlencoding::encode(path).into_owned(),
        };
    }

    if require_publisher && !manager.is_publisher() {
        return AccessDecision::RedirectHome;
    }

    AccessDecision::Allow
}
