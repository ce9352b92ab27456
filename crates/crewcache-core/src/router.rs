//! Route table and navigation guard.
//!
//! Routes carry the same four flags the backend-facing client has always
//! used: requires-auth, requires-admin, requires-captain, requires-guest.
//! [`resolve`] runs before every transition and either lets it proceed or
//! names the redirect target.

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub requires_auth: bool,
    pub requires_admin: bool,
    pub requires_captain: bool,
    pub requires_guest: bool,
}

pub const LOGIN: &str = "/login";
pub const DASHBOARD: &str = "/dashboard";
pub const ADMIN: &str = "/admin";
pub const CAPTAIN: &str = "/captain";

pub const ROUTES: [Route; 4] = [
    Route {
        path: LOGIN,
        requires_auth: false,
        requires_admin: false,
        requires_captain: false,
        requires_guest: true,
    },
    Route {
        path: DASHBOARD,
        requires_auth: true,
        requires_admin: false,
        requires_captain: false,
        requires_guest: false,
    },
    Route {
        path: ADMIN,
        requires_auth: true,
        requires_admin: true,
        requires_captain: false,
        requires_guest: false,
    },
    Route {
        path: CAPTAIN,
        requires_auth: true,
        requires_admin: false,
        requires_captain: true,
        requires_guest: false,
    },
];

pub fn find_route(path: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| r.path == path)
}

/// Outcome of the navigation guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Proceed,
    Redirect(&'static str),
    NotFound,
}

/// Run the navigation guard for a transition to `path` given the current
/// user (None when signed out). `/` always lands on the login page.
pub fn resolve(path: &str, user: Option<&User>) -> NavOutcome {
    if path == "/" {
        return NavOutcome::Redirect(LOGIN);
    }
    let Some(route) = find_route(path) else {
        return NavOutcome::NotFound;
    };

    if route.requires_auth && user.is_none() {
        return NavOutcome::Redirect(LOGIN);
    }
    if route.requires_admin && !user.map(User::can_access_admin).unwrap_or(false) {
        return NavOutcome::Redirect(DASHBOARD);
    }
    if route.requires_captain
        && !user
            .map(|u| u.is_admin() || u.is_team_captain())
            .unwrap_or(false)
    {
        return NavOutcome::Redirect(DASHBOARD);
    }
    if route.requires_guest {
        if let Some(user) = user {
            // Already signed in: land on the role-appropriate dashboard.
            return if user.can_access_admin() {
                NavOutcome::Redirect(ADMIN)
            } else {
                NavOutcome::Redirect(DASHBOARD)
            };
        }
    }
    NavOutcome::Proceed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Team};

    fn user(role: Role, is_captain: bool) -> User {
        User {
            id: "1".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            team: Some(Team::Samurai),
            is_captain,
        }
    }

    #[test]
    fn test_guest_routes_redirect_signed_in_users() {
        let admin = user(Role::Admin, false);
        let member = user(Role::Member, false);
        assert_eq!(resolve(LOGIN, Some(&admin)), NavOutcome::Redirect(ADMIN));
        assert_eq!(resolve(LOGIN, Some(&member)), NavOutcome::Redirect(DASHBOARD));
        assert_eq!(resolve(LOGIN, None), NavOutcome::Proceed);
    }

    #[test]
    fn test_auth_routes_redirect_guests_to_login() {
        assert_eq!(resolve(DASHBOARD, None), NavOutcome::Redirect(LOGIN));
        assert_eq!(resolve(ADMIN, None), NavOutcome::Redirect(LOGIN));
    }

    #[test]
    fn test_admin_route_requires_elevated_role() {
        let member = user(Role::Member, false);
        let captain = user(Role::Captain, true);
        assert_eq!(resolve(ADMIN, Some(&member)), NavOutcome::Redirect(DASHBOARD));
        assert_eq!(resolve(ADMIN, Some(&captain)), NavOutcome::Proceed);
    }

    #[test]
    fn test_captain_route_accepts_flagged_members() {
        let flagged = user(Role::Member, true);
        let plain = user(Role::Member, false);
        assert_eq!(resolve(CAPTAIN, Some(&flagged)), NavOutcome::Proceed);
        assert_eq!(resolve(CAPTAIN, Some(&plain)), NavOutcome::Redirect(DASHBOARD));
    }

    #[test]
    fn test_root_redirects_to_login_and_unknown_is_not_found() {
        assert_eq!(resolve("/", None), NavOutcome::Redirect(LOGIN));
        assert_eq!(resolve("/nope", None), NavOutcome::NotFound);
    }
}
