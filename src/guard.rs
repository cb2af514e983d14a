//! Gating for protected surfaces.
//!
//! A protected view is wrapped in an explicit capability check: either the
//! session exists and the view renders, or it does not and the caller is told
//! to send the user to login. Two tagged outcomes, no side effects.

use crate::session::Session;

#[derive(Debug, PartialEq)]
pub enum Gate<T> {
    /// The session was present; the wrapped view ran and produced its output.
    Rendered(T),
    /// No session: render nothing, redirect to login.
    LoginRequired,
}

impl<T> Gate<T> {
    pub fn rendered(self) -> Option<T> {
        match self {
            Gate::Rendered(value) => Some(value),
            Gate::LoginRequired => None,
        }
    }
}

/// Run `render` only when a session exists. The closure may borrow from the
/// session it is handed.
pub fn guard_view<'a, T>(
    session: Option<&'a Session>,
    render: impl FnOnce(&'a Session) -> T,
) -> Gate<T> {
    match session {
        Some(session) => Gate::Rendered(render(session)),
        None => Gate::LoginRequired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::User;

    fn session() -> Session {
        Session {
            token: "token".to_string(),
            user: User {
                id: 1,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        }
    }

    #[test]
    fn renders_through_with_a_session() {
        let session = session();
        let gate = guard_view(Some(&session), |s| s.user.username.clone());
        assert_eq!(gate, Gate::Rendered("alice".to_string()));
    }

    #[test]
    fn redirects_and_renders_nothing_without_one() {
        let mut ran = false;
        let gate = guard_view(None, |_| {
            ran = true;
        });
        assert_eq!(gate.rendered(), None);
        assert!(!ran);
    }
}
