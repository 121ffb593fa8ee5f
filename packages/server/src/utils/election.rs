use sea_orm::{ConnectionTrait, EntityTrait, QuerySelect, sea_query::LockType};
use uuid::Uuid;

use crate::entity::{candidate, election, profile};
use crate::error::AppError;

/// Look up an election by ID, returning 404 if not found.
pub async fn find_election<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<election::Model, AppError> {
    election::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Election not found".into()))
}

/// Look up an election with `FOR UPDATE` inside a transaction.
pub async fn find_election_for_update<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<election::Model, AppError> {
    election::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Election not found".into()))
}

/// Look up a candidate of the given election, returning 404 if it stands elsewhere.
pub async fn find_candidate<C: ConnectionTrait>(
    db: &C,
    election_id: Uuid,
    candidate_id: Uuid,
) -> Result<candidate::Model, AppError> {
    candidate::Entity::find_by_id(candidate_id)
        .one(db)
        .await?
        .filter(|c| c.election_id == election_id)
        .ok_or_else(|| AppError::NotFound("Candidate not found".into()))
}

pub async fn find_profile<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<profile::Model, AppError> {
    profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))
}
