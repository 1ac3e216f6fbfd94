//! Role-based authorization gate.
//!
//! Every navigation or command is checked against the current session with
//! [`can_access`]. The gate is evaluated fresh each time; nothing here caches
//! a role between calls.
//!
//! The role comes from a token claim decoded on the client without signature
//! verification. The gate decides what to *offer*; the backend still checks
//! every request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// Identity of the signed-in user, as read from the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Option<UserId>,
    pub username: String,
    pub role: Role,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectTo(Route),
}

impl AccessDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether a session may reach something that requires `required`.
///
/// 1. No session: redirect to the login page.
/// 2. Session with another role: redirect to the home page.
/// 3. Otherwise allow.
#[must_use]
pub fn can_access(required: Role, session: Option<&Principal>) -> AccessDecision {
    match session {
        None => AccessDecision::RedirectTo(Route::Login),
        Some(principal) if principal.role != required => AccessDecision::RedirectTo(Route::Home),
        Some(_) => AccessDecision::Allow,
    }
}

/// Decide whether a session may navigate to `route`.
///
/// Public routes are always allowed.
#[must_use]
pub fn navigate(route: Route, session: Option<&Principal>) -> AccessDecision {
    route
        .required_role()
        .map_or(AccessDecision::Allow, |role| can_access(role, session))
}

/// Front-end routes, public and role-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    SignUp,
    AdminDashboard,
    AdminBookings,
    AdminInvoices,
    AdminCustomers,
    AdminVehicles,
    AdminServices,
    CustomerDashboard,
    CustomerBookings,
    CustomerVehicles,
    CustomerServices,
    CustomerInvoices,
    CustomerProfile,
}

impl Route {
    pub const ALL: [Self; 15] = [
        Self::Home,
        Self::Login,
        Self::SignUp,
        Self::AdminDashboard,
        Self::AdminBookings,
        Self::AdminInvoices,
        Self::AdminCustomers,
        Self::AdminVehicles,
        Self::AdminServices,
        Self::CustomerDashboard,
        Self::CustomerBookings,
        Self::CustomerVehicles,
        Self::CustomerServices,
        Self::CustomerInvoices,
        Self::CustomerProfile,
    ];

    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::SignUp => "/signup",
            Self::AdminDashboard => "/admin/dashboard",
            Self::AdminBookings => "/admin/bookings",
            Self::AdminInvoices => "/admin/invoices",
            Self::AdminCustomers => "/admin/customers",
            Self::AdminVehicles => "/admin/vehicles",
            Self::AdminServices => "/admin/services",
            Self::CustomerDashboard => "/customer/dashboard",
            Self::CustomerBookings => "/customer/bookings",
            Self::CustomerVehicles => "/customer/vehicles",
            Self::CustomerServices => "/customer/services",
            Self::CustomerInvoices => "/customer/invoices",
            Self::CustomerProfile => "/customer/profile",
        }
    }

    /// Role needed to view the route, or `None` for public routes.
    #[must_use]
    pub const fn required_role(&self) -> Option<Role> {
        match self {
            Self::Home | Self::Login | Self::SignUp => None,
            Self::AdminDashboard
            | Self::AdminBookings
            | Self::AdminInvoices
            | Self::AdminCustomers
            | Self::AdminVehicles
            | Self::AdminServices => Some(Role::Admin),
            Self::CustomerDashboard
            | Self::CustomerBookings
            | Self::CustomerVehicles
            | Self::CustomerServices
            | Self::CustomerInvoices
            | Self::CustomerProfile => Some(Role::Customer),
        }
    }

    /// Look up a route by path, ignoring a trailing slash.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl Role {
    /// Landing route after a successful login.
    #[must_use]
    pub const fn home_route(&self) -> Route {
        match self {
            Self::Admin => Route::AdminDashboard,
            Self::Customer => Route::CustomerDashboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: Some(UserId::new(1)),
            username: "sam".to_owned(),
            role,
        }
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        assert_eq!(
            can_access(Role::Admin, None),
            AccessDecision::RedirectTo(Route::Login)
        );
    }

    #[test]
    fn test_wrong_role_redirects_home() {
        let customer = principal(Role::Customer);
        assert_eq!(
            can_access(Role::Admin, Some(&customer)),
            AccessDecision::RedirectTo(Route::Home)
        );
    }

    #[test]
    fn test_matching_role_is_allowed() {
        let admin = principal(Role::Admin);
        assert_eq!(can_access(Role::Admin, Some(&admin)), AccessDecision::Allow);
    }

    #[test]
    fn test_navigate_public_routes() {
        assert!(navigate(Route::Login, None).is_allowed());
        assert!(navigate(Route::Home, None).is_allowed());
        assert_eq!(
            navigate(Route::CustomerBookings, None),
            AccessDecision::RedirectTo(Route::Login)
        );
        let admin = principal(Role::Admin);
        assert_eq!(
            navigate(Route::CustomerBookings, Some(&admin)),
            AccessDecision::RedirectTo(Route::Home)
        );
    }

    #[test]
    fn test_route_paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(
            Route::from_path("/admin/bookings/"),
            Some(Route::AdminBookings)
        );
        assert_eq!(Route::from_path("/nowhere"), None);
    }

    #[test]
    fn test_home_route_by_role() {
        assert_eq!(Role::Admin.home_route(), Route::AdminDashboard);
        assert_eq!(Role::Customer.home_route(), Route::CustomerDashboard);
    }
}
