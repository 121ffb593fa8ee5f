use ballot_common::{CandidateTally, ElectionStatus, turnout_percentage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::voting::ElectionResults;

/// Tallied results of one election.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ElectionResultsResponse {
    pub election_id: Uuid,
    #[schema(example = "Student Council President 2024")]
    pub title: String,
    pub status: ElectionStatus,
    /// Ranked by vote count descending, then candidate id ascending.
    pub candidates: Vec<CandidateTally>,
    #[schema(example = 1245)]
    pub total_votes: u64,
    #[schema(example = 1500)]
    pub eligible_voters: u64,
    /// Whole-number turnout, `null` when nobody is eligible.
    #[schema(example = 83)]
    pub turnout_percentage: Option<u32>,
    pub winner: Option<Uuid>,
    #[schema(example = "Jane Smith")]
    pub winner_name: Option<String>,
    pub is_tie: bool,
}

impl ElectionResultsResponse {
    pub fn new(results: ElectionResults, now: DateTime<Utc>) -> Self {
        let ElectionResults {
            election,
            tally,
            eligible_voters,
        } = results;
        let winner_name = tally.winner_name().map(str::to_string);

        Self {
            election_id: election.id,
            status: election.status_at(now),
            title: election.title,
            turnout_percentage: turnout_percentage(tally.total_votes, eligible_voters),
            total_votes: tally.total_votes,
            eligible_voters,
            winner: tally.winner,
            winner_name,
            is_tie: tally.is_tie,
            candidates: tally.candidates,
        }
    }
}
