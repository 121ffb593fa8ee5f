use ballot_common::{Access, RouteRequirement, SessionState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, trim_optional, validate_length};
use crate::entity::profile;
use crate::error::AppError;

/// Request body for registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// College email; stored lower-cased.
    #[schema(example = "jane.smith@college.edu")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Smith")]
    pub last_name: String,
    /// Optional student number (1-32 letters, digits or dashes).
    #[schema(example = "STU-2024-001")]
    pub student_id: Option<String>,
}

/// Lower-case and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email.len() <= 254
        && !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
    if !valid {
        return Err(AppError::Validation(
            "Please enter a valid email address".into(),
        ));
    }
    Ok(())
}

fn validate_student_id(student_id: &str) -> Result<(), AppError> {
    validate_length(student_id, "Student ID", 1, 32)?;
    if !student_id
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AppError::Validation(
            "Student ID must contain only letters, digits, and dashes".into(),
        ));
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_email(&normalize_email(&payload.email))?;
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    validate_length(&payload.first_name, "First name", 1, 100)?;
    validate_length(&payload.last_name, "Last name", 1, 100)?;
    if let Some(ref student_id) = payload.student_id
        && !student_id.trim().is_empty()
    {
        validate_student_id(student_id)?;
    }
    Ok(())
}

/// Request body for the password step of login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane.smith@college.edu")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// A pending passcode verification.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ChallengeResponse {
    pub challenge_id: Uuid,
    /// Where the passcode was sent, with most of the local part hidden.
    #[schema(example = "ja***@college.edu")]
    pub masked_email: String,
    pub expires_at: DateTime<Utc>,
    /// Earliest time a new passcode may be requested.
    pub resend_available_at: DateTime<Utc>,
}

/// Request body for the passcode step of login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyRequest {
    pub challenge_id: Uuid,
    /// Six-digit passcode.
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResendRequest {
    pub challenge_id: Uuid,
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub profile: ProfileResponse,
}

/// A profile as returned to clients. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    #[schema(example = "jane.smith@college.edu")]
    pub email: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Smith")]
    pub last_name: String,
    #[schema(example = "STU-2024-001")]
    pub student_id: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<profile::Model> for ProfileResponse {
    fn from(m: profile::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            student_id: m.student_id,
            is_admin: m.is_admin,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Edits a profile owner may make to themself.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `null` clears the student ID.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub student_id: Option<Option<String>>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(ref first_name) = payload.first_name {
        validate_length(first_name, "First name", 1, 100)?;
    }
    if let Some(ref last_name) = payload.last_name {
        validate_length(last_name, "Last name", 1, 100)?;
    }
    if let Some(Some(student_id)) = payload.student_id.as_ref().map(|s| trim_optional(s.clone()))
    {
        validate_student_id(&student_id)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RouteAccessQuery {
    /// Portal path being navigated to, e.g. `/admin/elections/new`.
    pub path: String,
}

/// Navigation decision for a portal path.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RouteAccessResponse {
    pub path: String,
    pub session: SessionState,
    pub requirement: RouteRequirement,
    pub access: Access,
}
