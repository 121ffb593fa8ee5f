use ballot_common::ElectionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candidate::{CandidateResponse, CreateCandidateRequest, validate_create_candidate};
use super::shared::{Pagination, double_option, validate_length, validate_optional_text};
use crate::entity::{candidate, election};
use crate::error::AppError;

const MAX_DESCRIPTION_CHARS: usize = 10_000;
const MAX_INITIAL_CANDIDATES: usize = 50;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateElectionRequest {
    #[schema(example = "Student Council President 2024")]
    pub title: String,
    #[schema(example = "Annual election for the student council president.")]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Candidates created together with the election.
    #[serde(default)]
    pub candidates: Vec<CreateCandidateRequest>,
}

/// PATCH body. Dates are checked against the stored values when only one is given.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateElectionRequest {
    pub title: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl UpdateElectionRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ElectionListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Filter by status derived from the voting window.
    pub status: Option<ElectionStatus>,
    /// Case-insensitive title search.
    pub search: Option<String>,
    /// One of `start_date`, `end_date`, `created_at` (default), `title`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ElectionResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Status at the time of the response.
    pub status: ElectionStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ElectionResponse {
    pub fn from_model(m: election::Model, now: DateTime<Utc>) -> Self {
        Self {
            status: m.status_at(now),
            id: m.id,
            title: m.title,
            description: m.description,
            start_date: m.start_date,
            end_date: m.end_date,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// An election with its candidates.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ElectionDetailResponse {
    #[serde(flatten)]
    pub election: ElectionResponse,
    pub candidates: Vec<CandidateResponse>,
}

impl ElectionDetailResponse {
    pub fn new(
        election: election::Model,
        candidates: Vec<candidate::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            election: ElectionResponse::from_model(election, now),
            candidates: candidates.into_iter().map(CandidateResponse::from).collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ElectionListResponse {
    pub data: Vec<ElectionResponse>,
    pub pagination: Pagination,
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation(
            "end_date must be after start_date".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_election(req: &CreateElectionRequest) -> Result<(), AppError> {
    validate_length(&req.title, "Title", 3, 256)?;
    validate_optional_text(req.description.as_deref(), "Description", MAX_DESCRIPTION_CHARS)?;
    validate_window(req.start_date, req.end_date)?;
    if req.candidates.len() > MAX_INITIAL_CANDIDATES {
        return Err(AppError::Validation(format!(
            "Too many candidates: max {MAX_INITIAL_CANDIDATES}"
        )));
    }
    for candidate in &req.candidates {
        validate_create_candidate(candidate)?;
    }
    Ok(())
}

/// Validate a PATCH against the stored window of the election it applies to.
pub fn validate_update_election(
    req: &UpdateElectionRequest,
    current_start: DateTime<Utc>,
    current_end: DateTime<Utc>,
) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_length(title, "Title", 3, 256)?;
    }
    validate_optional_text(
        req.description.clone().flatten().as_deref(),
        "Description",
        MAX_DESCRIPTION_CHARS,
    )?;
    validate_window(
        req.start_date.unwrap_or(current_start),
        req.end_date.unwrap_or(current_end),
    )
}
