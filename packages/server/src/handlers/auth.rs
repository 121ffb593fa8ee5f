use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use ballot_common::{RouteRequirement, SessionState, access::decide};
use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::OtpConfig;
use crate::entity::{otp_challenge, profile};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    ChallengeResponse, LoginRequest, ProfileResponse, RegisterRequest, ResendRequest,
    RouteAccessQuery, RouteAccessResponse, TokenResponse, UpdateProfileRequest, VerifyRequest,
    normalize_email, validate_login_request, validate_register_request, validate_update_profile,
};
use crate::models::shared::trim_optional;
use crate::state::AppState;
use crate::utils::election::find_profile;
use crate::utils::{hash, jwt, otp};

/// Map a unique violation on `profiles` to the field that caused it.
fn profile_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("email") => {
            AppError::EmailTaken
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Student ID is already registered".into())
        }
        _ => AppError::from(err),
    }
}

async fn ensure_student_id_free<C: ConnectionTrait>(
    db: &C,
    student_id: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut query = profile::Entity::find().filter(profile::Column::StudentId.eq(student_id));
    if let Some(id) = except {
        query = query.filter(profile::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(AppError::Conflict("Student ID is already registered".into()));
    }
    Ok(())
}

fn next_code(config: &OtpConfig) -> String {
    config.demo_code.clone().unwrap_or_else(otp::generate_code)
}

/// Passcode delivery is simulated: the code goes to the server log.
fn deliver_code(challenge_id: Uuid, email: &str, code: &str) {
    info!(
        challenge_id = %challenge_id,
        to = %otp::mask_email(email),
        code,
        "Passcode issued"
    );
}

fn challenge_response(
    challenge: &otp_challenge::Model,
    email: &str,
    config: &OtpConfig,
) -> ChallengeResponse {
    ChallengeResponse {
        challenge_id: challenge.id,
        masked_email: otp::mask_email(email),
        expires_at: challenge.expires_at,
        resend_available_at: challenge.last_sent_at + config.resend_cooldown(),
    }
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new voter profile",
    description = "Creates a profile with the given email and password. The email is stored lower-cased. New profiles are never administrators.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Profile created", body = ProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email or student ID taken (EMAIL_TAKEN, CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = normalize_email(&payload.email);
    let student_id = trim_optional(payload.student_id);

    let existing = profile::Entity::find()
        .filter(profile::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::EmailTaken);
    }
    if let Some(ref student_id) = student_id {
        ensure_student_id_free(&state.db, student_id, None).await?;
    }

    let password = hash::hash_password_blocking(payload.password).await?;

    let now = Utc::now();
    let new_profile = profile::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email),
        password: Set(password),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        student_id: Set(student_id),
        is_admin: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let profile = new_profile.insert(&state.db).await.map_err(|e| {
        tracing::debug!("Registration race condition: unique constraint caught on insert");
        profile_conflict(e)
    })?;

    info!(profile_id = %profile.id, "Profile registered");

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Check credentials and send a passcode",
    description = "First login step. On valid credentials a six-digit passcode is issued for the profile's email and a challenge is returned; exchange it for a token with `/auth/verify`. Earlier pending challenges of the profile are discarded.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Passcode sent", body = ChallengeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<ChallengeResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = normalize_email(&payload.email);

    let Some(profile) = profile::Entity::find()
        .filter(profile::Column::Email.eq(&email))
        .one(&state.db)
        .await?
    else {
        // Same argon2 cost as a real check, so unknown emails are not told apart by timing.
        hash::verify_dummy_blocking(payload.password).await?;
        return Err(AppError::InvalidCredentials);
    };

    let is_valid =
        hash::verify_password_blocking(payload.password, profile.password.clone()).await?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let otp_config = &state.config.auth.otp;
    let code = next_code(otp_config);
    let now = Utc::now();

    let txn = state.db.begin().await?;

    otp_challenge::Entity::delete_many()
        .filter(otp_challenge::Column::ProfileId.eq(profile.id))
        .filter(otp_challenge::Column::ConsumedAt.is_null())
        .exec(&txn)
        .await?;

    let challenge = otp_challenge::ActiveModel {
        id: Set(Uuid::now_v7()),
        profile_id: Set(profile.id),
        code_hash: Set(otp::hash_code(&code)),
        attempts: Set(0),
        expires_at: Set(now + otp_config.ttl()),
        last_sent_at: Set(now),
        consumed_at: Set(None),
        created_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    deliver_code(challenge.id, &profile.email, &code);

    Ok(Json(challenge_response(&challenge, &profile.email, otp_config)))
}

#[utoipa::path(
    post,
    path = "/verify",
    tag = "Auth",
    operation_id = "verifyPasscode",
    summary = "Exchange a passcode for a token",
    description = "Second login step. A wrong code counts against the challenge's attempt limit; once the limit is reached, or the challenge expires, a new login is required.",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 400, description = "Malformed code (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong, expired or used code (INVALID_OTP)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(challenge_id = %payload.challenge_id))]
pub async fn verify(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let code = payload.code.trim();
    if !otp::is_well_formed(code) {
        return Err(AppError::Validation(
            "Please enter a valid 6-digit code".into(),
        ));
    }

    let otp_config = &state.config.auth.otp;
    let now = Utc::now();

    let txn = state.db.begin().await?;

    let challenge = otp_challenge::Entity::find_by_id(payload.challenge_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::InvalidOtp("Invalid or expired code".into()))?;

    if challenge.consumed_at.is_some() || challenge.expires_at < now {
        return Err(AppError::InvalidOtp(
            "Code has expired. Please sign in again".into(),
        ));
    }
    if challenge.attempts >= otp_config.max_attempts as i32 {
        return Err(AppError::InvalidOtp(
            "Too many incorrect attempts. Please sign in again".into(),
        ));
    }

    let profile_id = challenge.profile_id;

    if otp::hash_code(code) != challenge.code_hash {
        let attempts = challenge.attempts + 1;
        let mut active: otp_challenge::ActiveModel = challenge.into();
        active.attempts = Set(attempts);
        active.update(&txn).await?;
        txn.commit().await?;

        return Err(AppError::InvalidOtp("Incorrect code".into()));
    }

    let mut active: otp_challenge::ActiveModel = challenge.into();
    active.consumed_at = Set(Some(now));
    active.update(&txn).await?;

    let profile = find_profile(&txn, profile_id).await?;
    txn.commit().await?;

    let token = jwt::sign(
        profile.id,
        &profile.email,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    info!(profile_id = %profile.id, "Signed in");

    Ok(Json(TokenResponse {
        token,
        profile: profile.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/resend",
    tag = "Auth",
    operation_id = "resendPasscode",
    summary = "Send a fresh passcode for a pending challenge",
    description = "Replaces the challenge's passcode and extends its lifetime. Allowed once the resend cooldown has elapsed since the last send. Wrong attempts already made still count; an expired or exhausted challenge requires a new login.",
    request_body = ResendRequest,
    responses(
        (status = 200, description = "Passcode re-sent", body = ChallengeResponse),
        (status = 401, description = "Challenge no longer valid (INVALID_OTP)", body = ErrorBody),
        (status = 429, description = "Cooldown not elapsed (RATE_LIMITED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(challenge_id = %payload.challenge_id))]
pub async fn resend(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResendRequest>,
) -> Result<Json<ChallengeResponse>, AppError> {
    let otp_config = &state.config.auth.otp;
    let now = Utc::now();

    let txn = state.db.begin().await?;

    let challenge = otp_challenge::Entity::find_by_id(payload.challenge_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .filter(|c| {
            c.consumed_at.is_none()
                && c.expires_at >= now
                && c.attempts < otp_config.max_attempts as i32
        })
        .ok_or_else(|| AppError::InvalidOtp("Challenge is no longer valid. Please sign in again".into()))?;

    let retry_at = challenge.last_sent_at + otp_config.resend_cooldown();
    if now < retry_at {
        return Err(AppError::RateLimited {
            retry_after: Ord::max((retry_at - now).num_seconds(), 1) as u64,
        });
    }

    let profile = find_profile(&txn, challenge.profile_id).await?;
    let code = next_code(otp_config);

    let mut active: otp_challenge::ActiveModel = challenge.into();
    active.code_hash = Set(otp::hash_code(&code));
    active.expires_at = Set(now + otp_config.ttl());
    active.last_sent_at = Set(now);
    let challenge = active.update(&txn).await?;

    txn.commit().await?;

    deliver_code(challenge.id, &profile.email, &code);

    Ok(Json(challenge_response(&challenge, &profile.email, otp_config)))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getMe",
    summary = "Get the current profile",
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(profile_id = %auth_user.profile_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = find_profile(&state.db, auth_user.profile_id).await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Auth",
    operation_id = "updateMe",
    summary = "Edit the current profile",
    description = "Updates the caller's names and student ID. Email, password and the admin flag cannot be changed here.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Student ID taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(profile_id = %auth_user.profile_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    validate_update_profile(&payload)?;

    let existing = find_profile(&state.db, auth_user.profile_id).await?;
    let mut active: profile::ActiveModel = existing.into();

    if let Some(ref first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(ref last_name) = payload.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(student_id) = payload.student_id {
        let student_id = trim_optional(student_id);
        if let Some(ref student_id) = student_id {
            ensure_student_id_free(&state.db, student_id, Some(auth_user.profile_id)).await?;
        }
        active.student_id = Set(student_id);
    }
    active.updated_at = Set(Utc::now());

    let profile = active.update(&state.db).await.map_err(profile_conflict)?;

    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/route-access",
    tag = "Auth",
    operation_id = "routeAccess",
    summary = "Decide whether a portal page may be shown",
    description = "Evaluates the page-gating table for the given path and the caller's session. A missing or stale token counts as signed out. Guests sent to the login page get the original path back in `from`.",
    params(RouteAccessQuery),
    responses(
        (status = 200, description = "Navigation decision", body = RouteAccessResponse),
    ),
)]
#[instrument(skip(auth_user, query), fields(path = %query.path))]
pub async fn route_access(
    auth_user: Option<AuthUser>,
    Query(query): Query<RouteAccessQuery>,
) -> Json<RouteAccessResponse> {
    let session = auth_user
        .as_ref()
        .map_or(SessionState::Unauthenticated, AuthUser::session);
    let requirement = RouteRequirement::for_path(&query.path);
    let access = decide(session, requirement, &query.path);

    Json(RouteAccessResponse {
        path: query.path,
        session,
        requirement,
        access,
    })
}
