use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, validate_length, validate_optional_text};
use crate::entity::candidate;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCandidateRequest {
    #[schema(example = "Jane Smith")]
    pub name: String,
    #[schema(example = "Third-year economics student")]
    pub bio: Option<String>,
    #[schema(example = "Longer library hours and a student-run food bank.")]
    pub platform: Option<String>,
    #[schema(example = "https://cdn.college.edu/candidates/jane.jpg")]
    pub photo_url: Option<String>,
}

/// PATCH body; `null` clears an optional field.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCandidateRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub platform: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub photo_url: Option<Option<String>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CandidateResponse {
    pub id: Uuid,
    pub election_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub platform: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<candidate::Model> for CandidateResponse {
    fn from(m: candidate::Model) -> Self {
        Self {
            id: m.id,
            election_id: m.election_id,
            name: m.name,
            bio: m.bio,
            platform: m.platform,
            photo_url: m.photo_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn validate_photo_url(url: Option<&str>) -> Result<(), AppError> {
    if let Some(url) = url {
        if url.len() > 2048 {
            return Err(AppError::Validation(
                "photo_url must be at most 2048 characters".into(),
            ));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::Validation(
                "photo_url must be an http(s) URL".into(),
            ));
        }
    }
    Ok(())
}

pub fn validate_create_candidate(req: &CreateCandidateRequest) -> Result<(), AppError> {
    validate_length(&req.name, "Candidate name", 1, 100)?;
    validate_optional_text(req.bio.as_deref(), "Bio", 2_000)?;
    validate_optional_text(req.platform.as_deref(), "Platform", 10_000)?;
    validate_photo_url(req.photo_url.as_deref())
}

pub fn validate_update_candidate(req: &UpdateCandidateRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_length(name, "Candidate name", 1, 100)?;
    }
    validate_optional_text(req.bio.clone().flatten().as_deref(), "Bio", 2_000)?;
    validate_optional_text(req.platform.clone().flatten().as_deref(), "Platform", 10_000)?;
    validate_photo_url(req.photo_url.clone().flatten().as_deref())
}
