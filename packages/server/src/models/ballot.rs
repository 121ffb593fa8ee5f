use ballot_common::ElectionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::vote;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CastVoteRequest {
    pub candidate_id: Uuid,
}

/// Confirmation of a recorded ballot. The chosen candidate is not echoed back.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VoteReceipt {
    pub vote_id: Uuid,
    pub election_id: Uuid,
    pub cast_at: DateTime<Utc>,
}

impl From<vote::Model> for VoteReceipt {
    fn from(m: vote::Model) -> Self {
        Self {
            vote_id: m.id,
            election_id: m.election_id,
            cast_at: m.created_at,
        }
    }
}

/// Caller's standing in one election, as shown on the ballot page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VoteStatusResponse {
    pub election_id: Uuid,
    pub status: ElectionStatus,
    pub is_active: bool,
    pub has_voted: bool,
    pub is_eligible: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ElectionActiveResponse {
    pub election_id: Uuid,
    pub is_active: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HasVotedResponse {
    pub election_id: Uuid,
    pub profile_id: Uuid,
    pub has_voted: bool,
}
