use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::voting::BallotError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `INVALID_OTP`, `PERMISSION_DENIED`,
    /// `NOT_FOUND`, `CONFLICT`, `EMAIL_TAKEN`, `ELECTION_NOT_ACTIVE`, `ALREADY_VOTED`,
    /// `INVALID_CANDIDATE`, `NOT_ELIGIBLE`, `RESULTS_NOT_AVAILABLE`, `RATE_LIMITED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "ALREADY_VOTED")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "You have already cast a ballot in this election")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    InvalidOtp(String),
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    ElectionNotActive,
    AlreadyVoted,
    InvalidCandidate,
    NotEligible,
    ResultsNotAvailable,
    /// Rate limit exceeded. Contains seconds until retry is allowed.
    RateLimited {
        retry_after: u64,
    },
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                },
            ),
            AppError::InvalidOtp(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_OTP",
                    message: msg,
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "An account with this email already exists".into(),
                },
            ),
            AppError::ElectionNotActive => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ELECTION_NOT_ACTIVE",
                    message: "Voting is not open for this election".into(),
                },
            ),
            AppError::AlreadyVoted => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ALREADY_VOTED",
                    message: "You have already cast a ballot in this election".into(),
                },
            ),
            AppError::InvalidCandidate => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    code: "INVALID_CANDIDATE",
                    message: "The selected candidate is not standing in this election".into(),
                },
            ),
            AppError::NotEligible => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "NOT_ELIGIBLE",
                    message: "You are not on the voter list for this election".into(),
                },
            ),
            AppError::ResultsNotAvailable => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "RESULTS_NOT_AVAILABLE",
                    message: "Results are published once the election has closed".into(),
                },
            ),
            AppError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    code: "RATE_LIMITED",
                    message: format!("Rate limit exceeded. Try again in {} seconds", retry_after),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = if let AppError::RateLimited { retry_after } = &self {
            Some(*retry_after)
        } else {
            None
        };

        let (status, body) = self.status_and_body();

        if let Some(seconds) = retry_after {
            (status, [("Retry-After", seconds.to_string())], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<BallotError> for AppError {
    fn from(err: BallotError) -> Self {
        match err {
            BallotError::ElectionNotFound => AppError::NotFound("Election not found".into()),
            BallotError::ElectionNotActive => AppError::ElectionNotActive,
            BallotError::InvalidCandidate => AppError::InvalidCandidate,
            BallotError::NotEligible => AppError::NotEligible,
            BallotError::AlreadyVoted => AppError::AlreadyVoted,
            BallotError::Database(e) => AppError::from(e),
        }
    }
}
