use axum::Json;
use axum::extract::{Path, State};
use ballot_common::ElectionStatus;
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::results::ElectionResultsResponse;
use crate::state::AppState;
use crate::utils::election::find_election;
use crate::voting::BallotService;

#[utoipa::path(
    get,
    path = "/{id}/results",
    tag = "Results",
    operation_id = "getElectionResults",
    summary = "Get the tallied results of an election",
    description = "Counts ballots per candidate at request time. Every candidate is listed, with zero when they received no ballots, ranked by count then candidate ID. Voters can read results once the election has closed; administrators at any time.",
    params(("id" = Uuid, Path, description = "Election ID")),
    responses(
        (status = 200, description = "Election results", body = ElectionResultsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Election still open (RESULTS_NOT_AVAILABLE)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_results(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ElectionResultsResponse>, AppError> {
    let now = Utc::now();

    if !auth_user.is_admin {
        let election = find_election(&state.db, id).await?;
        if election.status_at(now) != ElectionStatus::Completed {
            return Err(AppError::ResultsNotAvailable);
        }
    }

    let results = BallotService::new(&state.db, state.config.voting.eligibility)
        .get_election_results(id)
        .await?;

    Ok(Json(ElectionResultsResponse::new(results, now)))
}
