//! Session and role gate deciding which views and operations a caller may use.
//!
//! The gate is a pure predicate layer over an explicitly supplied session; it
//! never reads ambient state and never fails. Role names are parsed into
//! [`Role`] before comparison, so `"librarian"` only ever matches the
//! librarian role and never a longer name that happens to contain it.

use std::fmt;

use tracing::debug;

use crate::domain::{Role, Session};

/// Result of a gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Proceed.
    Allow,
    /// No session; send the caller to sign in.
    RedirectToLogin,
    /// Signed in but not permitted; send the caller home.
    RedirectToHome,
}

impl Access {
    /// Whether the caller may proceed.
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Entry requirements of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Anyone may enter.
    Public,
    /// Only callers without a session; others go home.
    GuestOnly,
    /// Any signed-in caller.
    Authenticated,
    /// Signed-in callers holding the role.
    RequiresRole(Role),
}

/// Navigable screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Landing page.
    Home,
    /// Sign-in form.
    Login,
    /// Account registration form.
    Signup,
    /// Catalogue browser.
    Books,
    /// Member administration.
    Members,
    /// Lending desk.
    Transactions,
    /// Overdue report.
    Reports,
    /// Caller's own outstanding loans.
    MyBooks,
}

impl View {
    /// Every view, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Home,
        Self::Books,
        Self::Members,
        Self::Transactions,
        Self::Reports,
        Self::MyBooks,
        Self::Login,
        Self::Signup,
    ];

    /// Entry requirements.
    pub const fn policy(self) -> AccessPolicy {
        match self {
            Self::Home | Self::Books => AccessPolicy::Public,
            Self::Login | Self::Signup => AccessPolicy::GuestOnly,
            Self::Transactions | Self::MyBooks => AccessPolicy::Authenticated,
            Self::Members | Self::Reports => AccessPolicy::RequiresRole(Role::Librarian),
        }
    }

    /// Route path.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Books => "/books",
            Self::Members => "/members",
            Self::Transactions => "/transactions",
            Self::Reports => "/reports",
            Self::MyBooks => "/my-books",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Gate evaluated against one (possibly absent) session.
///
/// # Examples
/// ```
/// use library_client::domain::{Access, AuthorizationGate, Role, View};
///
/// let gate = AuthorizationGate::new(None);
/// assert!(!gate.is_authenticated());
/// assert_eq!(
///     gate.authorize(View::Members, Some(Role::Librarian)),
///     Access::RedirectToLogin
/// );
/// assert_eq!(gate.navigate(View::Books), Access::Allow);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationGate<'a> {
    session: Option<&'a Session>,
}

impl<'a> AuthorizationGate<'a> {
    /// Gate over `session`.
    pub const fn new(session: Option<&'a Session>) -> Self {
        Self { session }
    }

    /// Session under evaluation.
    pub const fn session(&self) -> Option<&'a Session> {
        self.session
    }

    /// Whether a token-bearing session is present.
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the principal holds `role`; false without a session.
    pub fn has_role(&self, role: Role) -> bool {
        self.session
            .is_some_and(|session| session.principal().has_role(role))
    }

    /// Parse `name` (any case, optional `ROLE_` prefix) and check it.
    /// Unknown names are never held.
    pub fn has_role_named(&self, name: &str) -> bool {
        name.parse::<Role>().is_ok_and(|role| self.has_role(role))
    }

    /// Whether the principal holds any of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.session
            .is_some_and(|session| session.principal().roles().contains_any(roles))
    }

    /// Decide entry to `view` given an optional role requirement.
    pub fn authorize(&self, view: View, required_role: Option<Role>) -> Access {
        let access = match (self.session, required_role) {
            (None, _) => Access::RedirectToLogin,
            (Some(_), Some(role)) if !self.has_role(role) => Access::RedirectToHome,
            (Some(_), _) => Access::Allow,
        };
        debug!(view = %view, ?required_role, ?access, "authorization evaluated");
        access
    }

    /// Decide entry to `view` using its own access policy.
    pub fn navigate(&self, view: View) -> Access {
        match view.policy() {
            AccessPolicy::Public => Access::Allow,
            AccessPolicy::GuestOnly if self.is_authenticated() => Access::RedirectToHome,
            AccessPolicy::GuestOnly => Access::Allow,
            AccessPolicy::Authenticated => self.authorize(view, None),
            AccessPolicy::RequiresRole(role) => self.authorize(view, Some(role)),
        }
    }

    /// Book create, edit, and delete.
    pub fn can_manage_catalogue(&self) -> bool {
        self.has_any_role(&[Role::Admin, Role::Librarian])
    }

    /// Member create, edit, and delete.
    pub fn can_manage_members(&self) -> bool {
        self.has_any_role(&[Role::Admin, Role::Librarian])
    }

    /// Borrow and return on behalf of members.
    pub fn can_lend(&self) -> bool {
        self.has_any_role(&[Role::Admin, Role::Librarian])
    }

    /// Personal loan list.
    pub fn can_view_own_loans(&self) -> bool {
        self.has_role(Role::Member)
    }

    /// Views offered in the navigation menu for this caller.
    pub fn menu(&self) -> Vec<View> {
        let staff = self.can_lend();
        View::ALL
            .into_iter()
            .filter(|view| match view {
                View::Home | View::Books => true,
                View::Login | View::Signup => !self.is_authenticated(),
                View::Members | View::Transactions | View::Reports => staff,
                View::MyBooks => self.can_view_own_loans(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessToken, Principal, RoleSet, UserId};
    use rstest::rstest;

    fn session_with(roles: &[Role]) -> Session {
        Session::new(
            AccessToken::new("token").expect("token"),
            Principal::new(UserId::new(1), "casey", None, roles.iter().copied().collect::<RoleSet>()),
        )
    }

    #[rstest]
    #[case("librarian", true)]
    #[case("LIBRARIAN", true)]
    #[case("ROLE_LIBRARIAN", true)]
    #[case("admin", false)]
    #[case("lib", false)]
    #[case("", false)]
    fn role_names_match_exactly(#[case] name: &str, #[case] expected: bool) {
        let session = session_with(&[Role::Librarian]);
        assert_eq!(AuthorizationGate::new(Some(&session)).has_role_named(name), expected);
    }

    #[test]
    fn no_session_holds_no_role() {
        let gate = AuthorizationGate::new(None);
        assert!(!gate.has_role_named("librarian"));
        assert!(!gate.has_role(Role::Member));
        assert!(!gate.can_lend());
    }

    #[rstest]
    #[case(None, Access::RedirectToLogin)]
    #[case(Some(vec![Role::Member]), Access::RedirectToHome)]
    #[case(Some(vec![Role::Admin]), Access::RedirectToHome)]
    #[case(Some(vec![Role::Librarian]), Access::Allow)]
    fn authorize_with_librarian_requirement(
        #[case] roles: Option<Vec<Role>>,
        #[case] expected: Access,
    ) {
        let session = roles.map(|roles| session_with(&roles));
        let gate = AuthorizationGate::new(session.as_ref());
        assert_eq!(gate.authorize(View::Members, Some(Role::Librarian)), expected);
    }

    #[test]
    fn authorize_without_requirement_only_needs_session() {
        let session = session_with(&[]);
        let gate = AuthorizationGate::new(Some(&session));
        assert_eq!(gate.authorize(View::Transactions, None), Access::Allow);
    }

    #[rstest]
    #[case(View::Home, Access::Allow)]
    #[case(View::Books, Access::Allow)]
    #[case(View::Login, Access::Allow)]
    #[case(View::Transactions, Access::RedirectToLogin)]
    #[case(View::MyBooks, Access::RedirectToLogin)]
    #[case(View::Reports, Access::RedirectToLogin)]
    fn guest_navigation(#[case] view: View, #[case] expected: Access) {
        assert_eq!(AuthorizationGate::new(None).navigate(view), expected);
    }

    #[rstest]
    #[case(View::Signup, Access::RedirectToHome)]
    #[case(View::Members, Access::RedirectToHome)]
    #[case(View::Reports, Access::RedirectToHome)]
    #[case(View::MyBooks, Access::Allow)]
    #[case(View::Transactions, Access::Allow)]
    fn member_navigation(#[case] view: View, #[case] expected: Access) {
        let session = session_with(&[Role::Member]);
        assert_eq!(AuthorizationGate::new(Some(&session)).navigate(view), expected);
    }

    #[test]
    fn staff_capabilities() {
        let admin = session_with(&[Role::Admin]);
        let gate = AuthorizationGate::new(Some(&admin));
        assert!(gate.can_manage_catalogue());
        assert!(gate.can_manage_members());
        assert!(gate.can_lend());
        assert!(!gate.can_view_own_loans());
    }

    #[test]
    fn menu_follows_capabilities() {
        let librarian = session_with(&[Role::Librarian]);
        assert_eq!(
            AuthorizationGate::new(Some(&librarian)).menu(),
            vec![View::Home, View::Books, View::Members, View::Transactions, View::Reports]
        );
        assert_eq!(
            AuthorizationGate::new(None).menu(),
            vec![View::Home, View::Books, View::Login, View::Signup]
        );
    }
}
