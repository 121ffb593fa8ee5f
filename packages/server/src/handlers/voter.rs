use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entity::{election_voter, profile, vote};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::ProfileResponse;
use crate::models::shared::{Pagination, page_params};
use crate::models::voter::*;
use crate::state::AppState;
use crate::utils::election::{find_election, find_election_for_update, find_profile};
use crate::utils::query::{contains_any, fetch_page};

#[utoipa::path(
    get,
    path = "/",
    tag = "Voters",
    operation_id = "listVoters",
    summary = "List registered profiles",
    description = "Paginated list of profiles, newest first. `search` matches first name, last name, email or student ID case-insensitively. Requires administrator rights.",
    params(VoterListQuery),
    responses(
        (status = 200, description = "List of profiles", body = VoterListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_voters(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<VoterListQuery>,
) -> Result<Json<VoterListResponse>, AppError> {
    auth_user.require_admin()?;

    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = profile::Entity::find();

    if let Some(is_admin) = query.is_admin {
        select = select.filter(profile::Column::IsAdmin.eq(is_admin));
    }

    if let Some(condition) = query.search.as_deref().and_then(|search| {
        contains_any(
            &[
                profile::Column::FirstName,
                profile::Column::LastName,
                profile::Column::Email,
                profile::Column::StudentId,
            ],
            search,
        )
    }) {
        select = select.filter(condition);
    }

    let (rows, total) = fetch_page(
        &state.db,
        select,
        &[
            (profile::Column::CreatedAt, Order::Desc),
            (profile::Column::Id, Order::Asc),
        ],
        page,
        per_page,
    )
    .await?;
    let data = rows.into_iter().map(ProfileResponse::from).collect();

    Ok(Json(VoterListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Voters",
    operation_id = "updateVoter",
    summary = "Promote or demote a profile",
    description = "Grants or revokes administrator rights. Requires administrator rights. Administrators cannot demote themselves. The change applies to the profile's next request.",
    params(("id" = Uuid, Path, description = "Profile ID")),
    request_body = UpdateVoterRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Profile not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Self-demotion (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(is_admin = payload.is_admin))]
pub async fn update_voter(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateVoterRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    auth_user.require_admin()?;

    if id == auth_user.profile_id && !payload.is_admin {
        return Err(AppError::Conflict(
            "You cannot remove your own administrator rights".into(),
        ));
    }

    let existing = find_profile(&state.db, id).await?;
    if existing.is_admin == payload.is_admin {
        return Ok(Json(existing.into()));
    }

    let mut active: profile::ActiveModel = existing.into();
    active.is_admin = Set(payload.is_admin);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    info!(
        profile_id = %model.id,
        is_admin = model.is_admin,
        by = %auth_user.profile_id,
        "Administrator flag changed"
    );

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/enrollment",
    tag = "Enrollment",
    operation_id = "listEnrollment",
    summary = "List the voter roll of an election",
    description = "Enrolled profiles in enrollment order, with whether each has voted. Only consulted for eligibility when `voting.eligibility` is `enrollment`. Requires administrator rights.",
    params(
        ("id" = Uuid, Path, description = "Election ID"),
        EnrollmentListQuery,
    ),
    responses(
        (status = 200, description = "Enrolled voters", body = EnrollmentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Election not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_enrollment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<EnrollmentListQuery>,
) -> Result<Json<EnrollmentListResponse>, AppError> {
    auth_user.require_admin()?;
    find_election(&state.db, id).await?;

    let (page, per_page) = page_params(query.page, query.per_page);

    let select = election_voter::Entity::find().filter(election_voter::Column::ElectionId.eq(id));

    let (rows, total) = fetch_page(
        &state.db,
        select,
        &[
            (election_voter::Column::EnrolledAt, Order::Asc),
            (election_voter::Column::VoterId, Order::Asc),
        ],
        page,
        per_page,
    )
    .await?;

    let voter_ids: Vec<Uuid> = rows.iter().map(|r| r.voter_id).collect();

    let profiles: HashMap<Uuid, profile::Model> = profile::Entity::find()
        .filter(profile::Column::Id.is_in(voter_ids.iter().copied()))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let voted: HashSet<Uuid> = vote::Entity::find()
        .filter(vote::Column::ElectionId.eq(id))
        .filter(vote::Column::VoterId.is_in(voter_ids.iter().copied()))
        .select_only()
        .column(vote::Column::VoterId)
        .into_tuple::<Uuid>()
        .all(&state.db)
        .await?
        .into_iter()
        .collect();

    let data = rows
        .into_iter()
        .filter_map(|row| {
            let p = profiles.get(&row.voter_id)?;
            Some(EnrolledVoter {
                profile_id: p.id,
                email: p.email.clone(),
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                student_id: p.student_id.clone(),
                enrolled_at: row.enrolled_at,
                has_voted: voted.contains(&p.id),
            })
        })
        .collect();

    Ok(Json(EnrollmentListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/enrollment",
    tag = "Enrollment",
    operation_id = "enrollVoters",
    summary = "Add profiles to the voter roll of an election",
    description = "Enrolls the given profiles. Profiles already enrolled are skipped. Fails without changes if any profile does not exist. Requires administrator rights.",
    params(("id" = Uuid, Path, description = "Election ID")),
    request_body = EnrollVotersRequest,
    responses(
        (status = 200, description = "Profiles enrolled", body = EnrollVotersResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Election or profile not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(count = payload.profile_ids.len()))]
pub async fn enroll_voters(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<EnrollVotersRequest>,
) -> Result<Json<EnrollVotersResponse>, AppError> {
    auth_user.require_admin()?;
    validate_enroll_request(&payload)?;

    let txn = state.db.begin().await?;
    find_election_for_update(&txn, id).await?;

    let found = profile::Entity::find()
        .filter(profile::Column::Id.is_in(payload.profile_ids.iter().copied()))
        .count(&txn)
        .await?;
    if found != payload.profile_ids.len() as u64 {
        return Err(AppError::NotFound("One or more profiles not found".into()));
    }

    let already: HashSet<Uuid> = election_voter::Entity::find()
        .filter(election_voter::Column::ElectionId.eq(id))
        .filter(election_voter::Column::VoterId.is_in(payload.profile_ids.iter().copied()))
        .select_only()
        .column(election_voter::Column::VoterId)
        .into_tuple::<Uuid>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let now = Utc::now();
    let mut enrolled = 0u64;
    for profile_id in payload.profile_ids {
        if already.contains(&profile_id) {
            continue;
        }

        let model = election_voter::ActiveModel {
            election_id: Set(id),
            voter_id: Set(profile_id),
            enrolled_at: Set(now),
        };

        let result = election_voter::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    election_voter::Column::ElectionId,
                    election_voter::Column::VoterId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await;

        match result {
            Ok(_) => enrolled += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }

    txn.commit().await?;

    info!(election_id = %id, enrolled, "Voters enrolled");

    Ok(Json(EnrollVotersResponse { enrolled }))
}

#[utoipa::path(
    delete,
    path = "/{id}/enrollment/{profile_id}",
    tag = "Enrollment",
    operation_id = "removeEnrollment",
    summary = "Remove a profile from the voter roll of an election",
    description = "Refused once the profile has cast a ballot in the election, so the roll always covers every recorded vote. Requires administrator rights.",
    params(
        ("id" = Uuid, Path, description = "Election ID"),
        ("profile_id" = Uuid, Path, description = "Profile ID"),
    ),
    responses(
        (status = 204, description = "Enrollment removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Profile not enrolled (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Profile already voted (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn remove_enrollment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, profile_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let txn = state.db.begin().await?;
    // Serializes with ballots, which hold a share lock on the election row.
    find_election_for_update(&txn, id).await?;

    let voted = vote::Entity::find()
        .filter(vote::Column::ElectionId.eq(id))
        .filter(vote::Column::VoterId.eq(profile_id))
        .count(&txn)
        .await?
        > 0;
    if voted {
        return Err(AppError::Conflict(
            "Profile has already voted in this election and cannot be removed".into(),
        ));
    }

    let result = election_voter::Entity::delete_by_id((id, profile_id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Profile is not enrolled in this election".into()));
    }

    txn.commit().await?;

    info!(election_id = %id, profile_id = %profile_id, "Enrollment removed");

    Ok(StatusCode::NO_CONTENT)
}
