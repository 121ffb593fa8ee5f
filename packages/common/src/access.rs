//! Navigation gating for the portal's pages.
//!
//! The decision is a pure function of the session state and the page's requirement,
//! so the server and any client evaluate the same table.

use serde::Serialize;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Who is navigating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session restore has not finished yet.
    Loading,
    Unauthenticated,
    Voter,
    Admin,
}

impl SessionState {
    pub fn from_profile(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::Voter }
    }
}

/// What a page demands of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteRequirement {
    Public,
    /// Login and registration: signed-in users are sent to their dashboard.
    GuestOnly,
    Authenticated,
    Admin,
}

impl RouteRequirement {
    /// Requirement for a portal path. Unknown paths are public (they render the not-found page).
    pub fn for_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Public,
            ["login"] | ["register"] => Self::GuestOnly,
            ["dashboard"] => Self::Authenticated,
            ["elections", _] | ["elections", _, "results"] => Self::Authenticated,
            ["admin"] => Self::Admin,
            ["admin", "elections", "new"] => Self::Admin,
            ["admin", "elections", _, "edit"] | ["admin", "elections", _, "results"] => {
                Self::Admin
            }
            _ => Self::Public,
        }
    }
}

/// Outcome of a navigation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Access {
    Render,
    ShowLoading,
    Redirect {
        location: String,
        /// Page to return to after signing in.
        from: Option<String>,
    },
}

/// Decide whether `session` may view a page with `requirement`.
///
/// `path` is only used to remember where an unauthenticated visitor was headed.
pub fn decide(session: SessionState, requirement: RouteRequirement, path: &str) -> Access {
    use RouteRequirement as R;
    use SessionState as S;

    match (session, requirement) {
        (S::Loading, _) => Access::ShowLoading,
        (_, R::Public) => Access::Render,
        (S::Unauthenticated, R::GuestOnly) => Access::Render,
        (S::Unauthenticated, R::Authenticated | R::Admin) => Access::Redirect {
            location: LOGIN_PATH.to_string(),
            from: Some(path.to_string()),
        },
        (S::Voter | S::Admin, R::GuestOnly) | (S::Voter, R::Admin) => Access::Redirect {
            location: DASHBOARD_PATH.to_string(),
            from: None,
        },
        (S::Voter | S::Admin, R::Authenticated) | (S::Admin, R::Admin) => Access::Render,
    }
}
