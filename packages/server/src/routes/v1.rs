use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, ballot, candidate, dashboard, election, results, voter};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/elections", election_routes())
        .nest("/admin", admin_routes())
        .routes(routes!(dashboard::voter_dashboard))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::verify))
        .routes(routes!(auth::resend))
        .routes(routes!(auth::me, auth::update_me))
        .routes(routes!(auth::route_access))
}

fn election_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(election::list_elections, election::create_election))
        .routes(routes!(
            election::get_election,
            election::update_election,
            election::delete_election
        ))
        .routes(routes!(ballot::cast_vote))
        .routes(routes!(ballot::vote_status))
        .routes(routes!(ballot::is_election_active))
        .routes(routes!(ballot::has_user_voted))
        .routes(routes!(results::get_results))
        .routes(routes!(voter::list_enrollment, voter::enroll_voters))
        .routes(routes!(voter::remove_enrollment))
        .nest("/{id}/candidates", candidate_routes())
}

fn candidate_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            candidate::list_candidates,
            candidate::create_candidate
        ))
        .routes(routes!(
            candidate::update_candidate,
            candidate::delete_candidate
        ))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(dashboard::admin_stats))
        .nest("/voters", voter_routes())
}

fn voter_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(voter::list_voters))
        .routes(routes!(voter::update_voter))
}
