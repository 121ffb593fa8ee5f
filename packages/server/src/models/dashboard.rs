use ballot_common::ElectionStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One election card on the voter dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardElection {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ElectionStatus,
    pub candidate_count: u64,
    /// Set for active and completed elections.
    pub has_voted: Option<bool>,
    /// Set for completed elections that received votes.
    pub winner_name: Option<String>,
    /// Set for completed elections.
    pub total_votes: Option<u64>,
}

/// Elections grouped the way the voter dashboard tabs show them.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VoterDashboardResponse {
    pub active: Vec<DashboardElection>,
    pub upcoming: Vec<DashboardElection>,
    pub completed: Vec<DashboardElection>,
}

#[derive(Serialize, utoipa::ToSchema, Default)]
pub struct ElectionCounts {
    pub upcoming: u64,
    pub active: u64,
    pub completed: u64,
    pub total: u64,
}

/// Per-election figures on the admin dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ElectionSummary {
    pub id: Uuid,
    pub title: String,
    pub status: ElectionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[schema(example = 3)]
    pub candidate_count: u64,
    #[schema(example = 412)]
    pub total_votes: u64,
    #[schema(example = 500)]
    pub eligible_voters: u64,
    /// `null` when nobody is eligible.
    #[schema(example = 82)]
    pub turnout_percentage: Option<u32>,
    /// First-ranked candidate; `null` without votes.
    pub winner_name: Option<String>,
}

/// Headline figures for the admin dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminStatsResponse {
    #[schema(example = 1500)]
    pub total_profiles: u64,
    #[schema(example = 3)]
    pub total_admins: u64,
    /// Profiles that cast at least one ballot.
    #[schema(example = 1245)]
    pub voters_participated: u64,
    /// `voters_participated` over `total_profiles`, `null` with no profiles.
    #[schema(example = 83)]
    pub overall_turnout: Option<u32>,
    #[schema(example = 3120)]
    pub total_votes: u64,
    pub elections: ElectionCounts,
    /// Five most recently created elections with their tallies.
    pub recent_elections: Vec<ElectionSummary>,
}
