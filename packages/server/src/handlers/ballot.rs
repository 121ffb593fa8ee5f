use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::ballot::*;
use crate::state::AppState;
use crate::utils::election::find_election;
use crate::voting::BallotService;

#[utoipa::path(
    post,
    path = "/{id}/votes",
    tag = "Voting",
    operation_id = "castVote",
    summary = "Cast a ballot",
    description = "Records the caller's single ballot in the election. The election must be inside its voting window and the candidate must stand in it. A second ballot, including one racing the first, is rejected with ALREADY_VOTED. The receipt does not reveal the chosen candidate.",
    params(("id" = Uuid, Path, description = "Election ID")),
    request_body = CastVoteRequest,
    responses(
        (status = 201, description = "Ballot recorded", body = VoteReceipt),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not on the voter list (NOT_ELIGIBLE)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Voting closed or already voted (ELECTION_NOT_ACTIVE, ALREADY_VOTED)", body = ErrorBody),
        (status = 422, description = "Candidate not in this election (INVALID_CANDIDATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(profile_id = %auth_user.profile_id))]
pub async fn cast_vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CastVoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let vote = BallotService::new(&state.db, state.config.voting.eligibility)
        .cast_vote(id, payload.candidate_id, auth_user.profile_id, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(VoteReceipt::from(vote))))
}

#[utoipa::path(
    get,
    path = "/{id}/vote-status",
    tag = "Voting",
    operation_id = "getVoteStatus",
    summary = "Get the caller's standing in an election",
    description = "Whether the election is open, whether the caller may vote in it and whether they already have.",
    params(("id" = Uuid, Path, description = "Election ID")),
    responses(
        (status = 200, description = "Vote status", body = VoteStatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(profile_id = %auth_user.profile_id))]
pub async fn vote_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VoteStatusResponse>, AppError> {
    let election = find_election(&state.db, id).await?;
    let status = election.status_at(Utc::now());

    let ballots = BallotService::new(&state.db, state.config.voting.eligibility);
    let has_voted = ballots.has_user_voted(id, auth_user.profile_id).await?;
    let is_eligible = ballots.is_eligible(id, auth_user.profile_id).await?;

    Ok(Json(VoteStatusResponse {
        election_id: id,
        status,
        is_active: status.accepts_votes(),
        has_voted,
        is_eligible,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/active",
    tag = "Voting",
    operation_id = "isElectionActive",
    summary = "Check whether an election accepts ballots now",
    description = "True when the current time lies inside the election's window, bounds included. Unknown elections report false.",
    params(("id" = Uuid, Path, description = "Election ID")),
    responses(
        (status = 200, description = "Window check", body = ElectionActiveResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn is_election_active(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ElectionActiveResponse>, AppError> {
    let is_active = BallotService::new(&state.db, state.config.voting.eligibility)
        .is_election_active(id, Utc::now())
        .await?;

    Ok(Json(ElectionActiveResponse {
        election_id: id,
        is_active,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/voters/{profile_id}/has-voted",
    tag = "Voting",
    operation_id = "hasUserVoted",
    summary = "Check whether a profile has voted in an election",
    description = "Administrators may ask about anyone; voters only about themselves.",
    params(
        ("id" = Uuid, Path, description = "Election ID"),
        ("profile_id" = Uuid, Path, description = "Profile ID"),
    ),
    responses(
        (status = 200, description = "Ballot check", body = HasVotedResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn has_user_voted(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, profile_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<HasVotedResponse>, AppError> {
    auth_user.require_self_or_admin(profile_id)?;

    let has_voted = BallotService::new(&state.db, state.config.voting.eligibility)
        .has_user_voted(id, profile_id)
        .await?;

    Ok(Json(HasVotedResponse {
        election_id: id,
        profile_id,
        has_voted,
    }))
}
