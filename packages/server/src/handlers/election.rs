use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use ballot_common::ElectionStatus;
use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use super::candidate::new_candidate;
use crate::entity::{candidate, election, election_voter, vote};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::election::*;
use crate::models::shared::{Pagination, page_params, trim_optional};
use crate::state::AppState;
use crate::utils::election::{find_election, find_election_for_update};
use crate::utils::query::{contains_any, fetch_page};

/// Condition selecting elections whose window puts them in `status` at `now`.
pub(crate) fn status_condition(status: ElectionStatus, now: DateTime<Utc>) -> Condition {
    match status {
        ElectionStatus::Upcoming => Condition::all().add(election::Column::StartDate.gt(now)),
        ElectionStatus::Active => Condition::all()
            .add(election::Column::StartDate.lte(now))
            .add(election::Column::EndDate.gte(now)),
        ElectionStatus::Completed => Condition::all().add(election::Column::EndDate.lt(now)),
    }
}

pub(crate) async fn candidates_of<C: ConnectionTrait>(
    db: &C,
    election_id: Uuid,
) -> Result<Vec<candidate::Model>, DbErr> {
    candidate::Entity::find()
        .filter(candidate::Column::ElectionId.eq(election_id))
        .order_by_asc(candidate::Column::Id)
        .all(db)
        .await
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Elections",
    operation_id = "createElection",
    summary = "Create an election",
    description = "Creates an election and, optionally, its initial candidates in one transaction. Requires administrator rights. The stored status is set from the voting window.",
    request_body = CreateElectionRequest,
    responses(
        (status = 201, description = "Election created", body = ElectionDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_election(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateElectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_election(&payload)?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let model = election::ActiveModel {
        id: Set(Uuid::now_v7()),
        title: Set(payload.title.trim().to_string()),
        description: Set(trim_optional(payload.description)),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        status: Set(ElectionStatus::at(now, payload.start_date, payload.end_date)),
        created_by: Set(Some(auth_user.profile_id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let mut candidates = Vec::with_capacity(payload.candidates.len());
    for req in payload.candidates {
        candidates.push(new_candidate(model.id, req, now).insert(&txn).await?);
    }

    txn.commit().await?;

    info!(election_id = %model.id, candidates = candidates.len(), "Election created");

    Ok((
        StatusCode::CREATED,
        Json(ElectionDetailResponse::new(model, candidates, now)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Elections",
    operation_id = "listElections",
    summary = "List elections with pagination, filtering and search",
    description = "Returns a page of elections. `status` filters on the status derived from each election's window at request time. Supports sorting by `start_date`, `end_date`, `created_at` or `title`.",
    params(ElectionListQuery),
    responses(
        (status = 200, description = "List of elections", body = ElectionListResponse),
        (status = 400, description = "Invalid sort field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_elections(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ElectionListQuery>,
) -> Result<Json<ElectionListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);
    let now = Utc::now();

    let mut select = election::Entity::find();

    if let Some(status) = query.status {
        select = select.filter(status_condition(status, now));
    }

    if let Some(condition) = query
        .search
        .as_deref()
        .and_then(|search| contains_any(&[election::Column::Title], search))
    {
        select = select.filter(condition);
    }

    let sort_by = query.sort_by.as_deref().unwrap_or("created_at");
    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };
    let sort_column = match sort_by {
        "created_at" => election::Column::CreatedAt,
        "start_date" => election::Column::StartDate,
        "end_date" => election::Column::EndDate,
        "title" => election::Column::Title,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: created_at, start_date, end_date, title".into(),
            ));
        }
    };

    let (rows, total) = fetch_page(
        &state.db,
        select,
        &[(sort_column, sort_order), (election::Column::Id, Order::Asc)],
        page,
        per_page,
    )
    .await?;
    let data = rows
        .into_iter()
        .map(|m| ElectionResponse::from_model(m, now))
        .collect();

    Ok(Json(ElectionListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Elections",
    operation_id = "getElection",
    summary = "Get an election with its candidates",
    params(("id" = Uuid, Path, description = "Election ID")),
    responses(
        (status = 200, description = "Election details", body = ElectionDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_election(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ElectionDetailResponse>, AppError> {
    let model = find_election(&state.db, id).await?;
    let candidates = candidates_of(&state.db, id).await?;
    Ok(Json(ElectionDetailResponse::new(
        model,
        candidates,
        Utc::now(),
    )))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Elections",
    operation_id = "updateElection",
    summary = "Update an election",
    description = "Partially updates an election using PATCH semantics. Requires administrator rights. An empty payload returns the current resource unchanged. Cross-field validation ensures end_date stays after start_date even when updating one of the two. The row is locked so ballots being cast see either the old or the new window.",
    params(("id" = Uuid, Path, description = "Election ID")),
    request_body = UpdateElectionRequest,
    responses(
        (status = 200, description = "Election updated", body = ElectionDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_election(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateElectionRequest>,
) -> Result<Json<ElectionDetailResponse>, AppError> {
    auth_user.require_admin()?;

    let now = Utc::now();

    if payload.is_empty() {
        let existing = find_election(&state.db, id).await?;
        let candidates = candidates_of(&state.db, id).await?;
        return Ok(Json(ElectionDetailResponse::new(existing, candidates, now)));
    }

    let txn = state.db.begin().await?;
    let existing = find_election_for_update(&txn, id).await?;

    validate_update_election(&payload, existing.start_date, existing.end_date)?;

    let start_date = payload.start_date.unwrap_or(existing.start_date);
    let end_date = payload.end_date.unwrap_or(existing.end_date);

    let mut active: election::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(trim_optional(description));
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(end_date);
    }
    active.status = Set(ElectionStatus::at(now, start_date, end_date));
    active.updated_at = Set(now);

    let model = active.update(&txn).await?;
    let candidates = candidates_of(&txn, id).await?;
    txn.commit().await?;

    Ok(Json(ElectionDetailResponse::new(model, candidates, now)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Elections",
    operation_id = "deleteElection",
    summary = "Delete an election",
    description = "Permanently deletes an election and cascade-deletes its ballots, voter enrollment and candidates. Requires administrator rights.",
    params(("id" = Uuid, Path, description = "Election ID")),
    responses(
        (status = 204, description = "Election deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_election(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    let _election = find_election_for_update(&txn, id).await?;

    let votes = vote::Entity::delete_many()
        .filter(vote::Column::ElectionId.eq(id))
        .exec(&txn)
        .await?;
    election_voter::Entity::delete_many()
        .filter(election_voter::Column::ElectionId.eq(id))
        .exec(&txn)
        .await?;
    candidate::Entity::delete_many()
        .filter(candidate::Column::ElectionId.eq(id))
        .exec(&txn)
        .await?;
    election::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    info!(election_id = %id, votes_removed = votes.rows_affected, "Election deleted");

    Ok(StatusCode::NO_CONTENT)
}
