use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::State;
use ballot_common::{ElectionStatus, Tally, turnout_percentage};
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::election::status_condition;
use crate::config::EligibilityMode;
use crate::entity::{candidate, election, election_voter, profile, vote};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::dashboard::*;
use crate::state::AppState;

fn count_to_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

/// Tallies of several elections, built from one grouped count query.
async fn tallies_for<C: ConnectionTrait>(
    db: &C,
    election_ids: &[Uuid],
) -> Result<HashMap<Uuid, Tally>, DbErr> {
    if election_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let candidates: Vec<(Uuid, Uuid, String)> = candidate::Entity::find()
        .filter(candidate::Column::ElectionId.is_in(election_ids.iter().copied()))
        .select_only()
        .column(candidate::Column::ElectionId)
        .column(candidate::Column::Id)
        .column(candidate::Column::Name)
        .into_tuple()
        .all(db)
        .await?;

    let counts: Vec<(Uuid, Uuid, i64)> = vote::Entity::find()
        .filter(vote::Column::ElectionId.is_in(election_ids.iter().copied()))
        .select_only()
        .column(vote::Column::ElectionId)
        .column(vote::Column::CandidateId)
        .column_as(
            Expr::expr(Func::count(Expr::col(vote::Column::Id))),
            "vote_count",
        )
        .group_by(vote::Column::ElectionId)
        .group_by(vote::Column::CandidateId)
        .into_tuple()
        .all(db)
        .await?;

    let mut by_election: HashMap<Uuid, (Vec<(Uuid, String)>, Vec<(Uuid, u64)>)> = HashMap::new();
    for (election_id, id, name) in candidates {
        by_election.entry(election_id).or_default().0.push((id, name));
    }
    for (election_id, candidate_id, n) in counts {
        by_election
            .entry(election_id)
            .or_default()
            .1
            .push((candidate_id, count_to_u64(n)));
    }

    Ok(by_election
        .into_iter()
        .map(|(id, (candidates, counts))| (id, Tally::from_counts(candidates, counts)))
        .collect())
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Dashboard",
    operation_id = "getVoterDashboard",
    summary = "Get the voter dashboard",
    description = "The caller's elections grouped into active, upcoming and completed. Active and completed entries say whether the caller has voted; completed entries carry the winner and total ballots. With enrollment eligibility only elections the caller is enrolled in are listed.",
    responses(
        (status = 200, description = "Voter dashboard", body = VoterDashboardResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(profile_id = %auth_user.profile_id))]
pub async fn voter_dashboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<VoterDashboardResponse>, AppError> {
    let now = Utc::now();

    let mut select = election::Entity::find();
    if state.config.voting.eligibility == EligibilityMode::Enrollment {
        select = select.filter(
            election::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(election_voter::Column::ElectionId)
                    .from(election_voter::Entity)
                    .and_where(election_voter::Column::VoterId.eq(auth_user.profile_id))
                    .to_owned(),
            ),
        );
    }
    let elections = select
        .order_by_asc(election::Column::StartDate)
        .all(&state.db)
        .await?;

    let candidate_counts: HashMap<Uuid, u64> = candidate::Entity::find()
        .select_only()
        .column(candidate::Column::ElectionId)
        .column_as(
            Expr::expr(Func::count(Expr::col(candidate::Column::Id))),
            "candidate_count",
        )
        .group_by(candidate::Column::ElectionId)
        .into_tuple::<(Uuid, i64)>()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(id, n)| (id, count_to_u64(n)))
        .collect();

    let voted: HashSet<Uuid> = vote::Entity::find()
        .filter(vote::Column::VoterId.eq(auth_user.profile_id))
        .select_only()
        .column(vote::Column::ElectionId)
        .into_tuple::<Uuid>()
        .all(&state.db)
        .await?
        .into_iter()
        .collect();

    let completed_ids: Vec<Uuid> = elections
        .iter()
        .filter(|e| e.status_at(now) == ElectionStatus::Completed)
        .map(|e| e.id)
        .collect();
    let tallies = tallies_for(&state.db, &completed_ids).await?;

    let mut dashboard = VoterDashboardResponse {
        active: Vec::new(),
        upcoming: Vec::new(),
        completed: Vec::new(),
    };

    for e in elections {
        let status = e.status_at(now);
        let tally = tallies.get(&e.id);
        let entry = DashboardElection {
            candidate_count: candidate_counts.get(&e.id).copied().unwrap_or(0),
            has_voted: (status != ElectionStatus::Upcoming).then(|| voted.contains(&e.id)),
            winner_name: tally.and_then(|t| t.winner_name().map(str::to_string)),
            total_votes: (status == ElectionStatus::Completed)
                .then(|| tally.map_or(0, |t| t.total_votes)),
            id: e.id,
            title: e.title,
            description: e.description,
            start_date: e.start_date,
            end_date: e.end_date,
            status,
        };
        match status {
            ElectionStatus::Active => dashboard.active.push(entry),
            ElectionStatus::Upcoming => dashboard.upcoming.push(entry),
            ElectionStatus::Completed => dashboard.completed.push(entry),
        }
    }

    dashboard.active.sort_by_key(|e| e.end_date);
    dashboard.completed.sort_by(|a, b| b.end_date.cmp(&a.end_date));

    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Dashboard",
    operation_id = "getAdminStats",
    summary = "Get headline figures for the admin dashboard",
    description = "Profile, ballot and election counts, overall participation and a summary of the most recently created elections: candidates, ballots, eligible voters, turnout and the current leader. Requires administrator rights.",
    responses(
        (status = 200, description = "Admin statistics", body = AdminStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn admin_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStatsResponse>, AppError> {
    auth_user.require_admin()?;

    let now = Utc::now();

    let total_profiles = profile::Entity::find().count(&state.db).await?;
    let total_admins = profile::Entity::find()
        .filter(profile::Column::IsAdmin.eq(true))
        .count(&state.db)
        .await?;
    let total_votes = vote::Entity::find().count(&state.db).await?;

    let voters_participated = vote::Entity::find()
        .select_only()
        .column_as(
            Expr::expr(Func::count_distinct(Expr::col(vote::Column::VoterId))),
            "voters",
        )
        .into_tuple::<i64>()
        .one(&state.db)
        .await?
        .map_or(0, count_to_u64);

    let mut elections = ElectionCounts::default();
    for &status in ElectionStatus::ALL {
        let n = election::Entity::find()
            .filter(status_condition(status, now))
            .count(&state.db)
            .await?;
        match status {
            ElectionStatus::Upcoming => elections.upcoming = n,
            ElectionStatus::Active => elections.active = n,
            ElectionStatus::Completed => elections.completed = n,
        }
        elections.total += n;
    }

    let recent = election::Entity::find()
        .order_by_desc(election::Column::CreatedAt)
        .limit(Some(5))
        .all(&state.db)
        .await?;
    let recent_ids: Vec<Uuid> = recent.iter().map(|e| e.id).collect();
    let tallies = tallies_for(&state.db, &recent_ids).await?;

    let enrolled: HashMap<Uuid, u64> = match state.config.voting.eligibility {
        EligibilityMode::AllProfiles => HashMap::new(),
        EligibilityMode::Enrollment => election_voter::Entity::find()
            .filter(election_voter::Column::ElectionId.is_in(recent_ids.iter().copied()))
            .select_only()
            .column(election_voter::Column::ElectionId)
            .column_as(
                Expr::expr(Func::count(Expr::col(election_voter::Column::VoterId))),
                "voters",
            )
            .group_by(election_voter::Column::ElectionId)
            .into_tuple::<(Uuid, i64)>()
            .all(&state.db)
            .await?
            .into_iter()
            .map(|(id, n)| (id, count_to_u64(n)))
            .collect(),
    };

    let recent_elections = recent
        .into_iter()
        .map(|e| {
            let tally = tallies.get(&e.id);
            let total_votes = tally.map_or(0, |t| t.total_votes);
            let eligible_voters = match state.config.voting.eligibility {
                EligibilityMode::AllProfiles => total_profiles,
                EligibilityMode::Enrollment => enrolled.get(&e.id).copied().unwrap_or(0),
            };
            ElectionSummary {
                status: e.status_at(now),
                candidate_count: tally.map_or(0, |t| t.candidates.len() as u64),
                total_votes,
                eligible_voters,
                turnout_percentage: turnout_percentage(total_votes, eligible_voters),
                winner_name: tally.and_then(|t| t.winner_name().map(str::to_string)),
                id: e.id,
                title: e.title,
                start_date: e.start_date,
                end_date: e.end_date,
            }
        })
        .collect();

    Ok(Json(AdminStatsResponse {
        total_profiles,
        total_admins,
        voters_participated,
        overall_turnout: turnout_percentage(voters_participated, total_profiles),
        total_votes,
        elections,
        recent_elections,
    }))
}
