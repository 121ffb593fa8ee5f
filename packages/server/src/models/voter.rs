use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::ProfileResponse;
use super::shared::{Pagination, validate_bulk_ids};
use crate::error::AppError;

pub const MAX_ENROLL_BATCH: usize = 500;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VoterListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Matches name, email or student ID, case-insensitively.
    pub search: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VoterListResponse {
    pub data: Vec<ProfileResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateVoterRequest {
    /// Grant or revoke administrator rights.
    pub is_admin: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct EnrollVotersRequest {
    pub profile_ids: Vec<Uuid>,
}

pub fn validate_enroll_request(req: &EnrollVotersRequest) -> Result<(), AppError> {
    validate_bulk_ids(&req.profile_ids, "profile_ids", MAX_ENROLL_BATCH)
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrollVotersResponse {
    /// Profiles newly added; already-enrolled ones are skipped.
    pub enrolled: u64,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnrollmentListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrolledVoter {
    pub profile_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub has_voted: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrollmentListResponse {
    pub data: Vec<EnrolledVoter>,
    pub pagination: Pagination,
}
