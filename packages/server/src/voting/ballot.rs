use chrono::{DateTime, Utc};
use sea_orm::{
    TransactionSession,
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait, sea_query::LockType,
};
use tracing::info;
use uuid::Uuid;

use crate::config::EligibilityMode;
use crate::entity::{candidate, election, election_voter, profile, vote};

use super::BallotError;

/// Ballot operations over a connection or an open transaction.
pub struct BallotService<'a, C: ConnectionTrait> {
    pub(super) conn: &'a C,
    pub(super) eligibility: EligibilityMode,
}

impl<'a, C: ConnectionTrait> BallotService<'a, C> {
    pub fn new(conn: &'a C, eligibility: EligibilityMode) -> Self {
        Self { conn, eligibility }
    }

    /// Whether `voter_id` has a ballot recorded in the election.
    pub async fn has_user_voted(&self, election_id: Uuid, voter_id: Uuid) -> Result<bool, DbErr> {
        let count = vote::Entity::find()
            .filter(vote::Column::ElectionId.eq(election_id))
            .filter(vote::Column::VoterId.eq(voter_id))
            .count(self.conn)
            .await?;

        Ok(count > 0)
    }

    /// Whether the election's window contains `now`. Unknown elections are not active.
    pub async fn is_election_active(
        &self,
        election_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let election = election::Entity::find_by_id(election_id)
            .one(self.conn)
            .await?;

        Ok(election.is_some_and(|e| e.status_at(now).accepts_votes()))
    }

    /// Whether `voter_id` may vote in the election under the configured eligibility rule.
    pub async fn is_eligible(&self, election_id: Uuid, voter_id: Uuid) -> Result<bool, DbErr> {
        match self.eligibility {
            EligibilityMode::AllProfiles => Ok(true),
            EligibilityMode::Enrollment => {
                let enrolled = election_voter::Entity::find_by_id((election_id, voter_id))
                    .one(self.conn)
                    .await?;
                Ok(enrolled.is_some())
            }
        }
    }

    /// Size of the electorate used as the turnout denominator.
    pub async fn eligible_voter_count(&self, election_id: Uuid) -> Result<u64, DbErr> {
        match self.eligibility {
            EligibilityMode::AllProfiles => profile::Entity::find().count(self.conn).await,
            EligibilityMode::Enrollment => {
                election_voter::Entity::find()
                    .filter(election_voter::Column::ElectionId.eq(election_id))
                    .count(self.conn)
                    .await
            }
        }
    }
}

impl<'a, C: ConnectionTrait + TransactionTrait> BallotService<'a, C> {
    /// Record one ballot for `voter_id`.
    ///
    /// Runs in its own transaction. The election row is held with a shared lock so
    /// its window and candidates cannot change underneath the checks, and the unique
    /// `(election_id, voter_id)` key turns a lost race into [`BallotError::AlreadyVoted`].
    pub async fn cast_vote(
        &self,
        election_id: Uuid,
        candidate_id: Uuid,
        voter_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<vote::Model, BallotError> {
        let txn = self.conn.begin().await?;

        let election = election::Entity::find_by_id(election_id)
            .lock(LockType::Share)
            .one(&txn)
            .await?
            .ok_or(BallotError::ElectionNotFound)?;

        if !election.status_at(now).accepts_votes() {
            return Err(BallotError::ElectionNotActive);
        }

        let candidate = candidate::Entity::find_by_id(candidate_id)
            .one(&txn)
            .await?;
        if !candidate.is_some_and(|c| c.election_id == election_id) {
            return Err(BallotError::InvalidCandidate);
        }

        let scoped = BallotService::new(&txn, self.eligibility);
        if !scoped.is_eligible(election_id, voter_id).await? {
            return Err(BallotError::NotEligible);
        }
        if scoped.has_user_voted(election_id, voter_id).await? {
            return Err(BallotError::AlreadyVoted);
        }

        let model = vote::ActiveModel {
            id: Set(Uuid::now_v7()),
            election_id: Set(election_id),
            candidate_id: Set(candidate_id),
            voter_id: Set(voter_id),
            created_at: Set(now),
        };

        let vote = match model.insert(&txn).await {
            Ok(vote) => vote,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(BallotError::AlreadyVoted);
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;

        info!(
            vote_id = %vote.id,
            election_id = %election_id,
            voter_id = %voter_id,
            "Ballot recorded"
        );

        Ok(vote)
    }
}
