use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::election::candidates_of;
use crate::entity::{candidate, vote};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::candidate::*;
use crate::models::shared::trim_optional;
use crate::state::AppState;
use crate::utils::election::{find_candidate, find_election, find_election_for_update};

pub(crate) fn new_candidate(
    election_id: Uuid,
    req: CreateCandidateRequest,
    now: DateTime<Utc>,
) -> candidate::ActiveModel {
    candidate::ActiveModel {
        id: Set(Uuid::now_v7()),
        election_id: Set(election_id),
        name: Set(req.name.trim().to_string()),
        bio: Set(trim_optional(req.bio)),
        platform: Set(trim_optional(req.platform)),
        photo_url: Set(trim_optional(req.photo_url)),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Candidates",
    operation_id = "listCandidates",
    summary = "List the candidates of an election",
    params(("id" = Uuid, Path, description = "Election ID")),
    responses(
        (status = 200, description = "Candidates in creation order", body = Vec<CandidateResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_candidates(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CandidateResponse>>, AppError> {
    find_election(&state.db, id).await?;
    let candidates = candidates_of(&state.db, id).await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Candidates",
    operation_id = "createCandidate",
    summary = "Add a candidate to an election",
    description = "Requires administrator rights.",
    params(("id" = Uuid, Path, description = "Election ID")),
    request_body = CreateCandidateRequest,
    responses(
        (status = 201, description = "Candidate created", body = CandidateResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_candidate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CreateCandidateRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_candidate(&payload)?;

    let txn = state.db.begin().await?;
    find_election_for_update(&txn, id).await?;
    let model = new_candidate(id, payload, Utc::now()).insert(&txn).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(CandidateResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{candidate_id}",
    tag = "Candidates",
    operation_id = "updateCandidate",
    summary = "Update a candidate",
    description = "Partially updates a candidate using PATCH semantics; `null` clears an optional field. Requires administrator rights.",
    params(
        ("id" = Uuid, Path, description = "Election ID"),
        ("candidate_id" = Uuid, Path, description = "Candidate ID"),
    ),
    request_body = UpdateCandidateRequest,
    responses(
        (status = 200, description = "Candidate updated", body = CandidateResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Election or candidate not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_candidate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateCandidateRequest>,
) -> Result<Json<CandidateResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_candidate(&payload)?;

    let existing = find_candidate(&state.db, id, candidate_id).await?;
    let mut active: candidate::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(bio) = payload.bio {
        active.bio = Set(trim_optional(bio));
    }
    if let Some(platform) = payload.platform {
        active.platform = Set(trim_optional(platform));
    }
    if let Some(photo_url) = payload.photo_url {
        active.photo_url = Set(trim_optional(photo_url));
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{candidate_id}",
    tag = "Candidates",
    operation_id = "deleteCandidate",
    summary = "Remove a candidate",
    description = "Requires administrator rights. A candidate who has already received ballots cannot be removed; delete the whole election instead.",
    params(
        ("id" = Uuid, Path, description = "Election ID"),
        ("candidate_id" = Uuid, Path, description = "Candidate ID"),
    ),
    responses(
        (status = 204, description = "Candidate deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Election or candidate not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Candidate has ballots (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_candidate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    find_election_for_update(&txn, id).await?;
    find_candidate(&txn, id, candidate_id).await?;

    let ballots = vote::Entity::find()
        .filter(vote::Column::CandidateId.eq(candidate_id))
        .count(&txn)
        .await?;
    if ballots > 0 {
        return Err(AppError::Conflict(format!(
            "Candidate has received {} ballots and cannot be removed",
            ballots
        )));
    }

    candidate::Entity::delete_by_id(candidate_id)
        .exec(&txn)
        .await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
