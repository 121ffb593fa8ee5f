use ballot_common::Tally;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    TransactionSession,
    AccessMode, ColumnTrait, ConnectionTrait, EntityTrait, IsolationLevel, QueryFilter,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{candidate, election, vote};

use super::{BallotError, BallotService};

/// Tally of one election read from a single snapshot.
#[derive(Debug, Clone)]
pub struct ElectionResults {
    pub election: election::Model,
    pub tally: Tally,
    pub eligible_voters: u64,
}

impl<'a, C: ConnectionTrait + TransactionTrait> BallotService<'a, C> {
    /// Count the votes of every candidate in the election.
    ///
    /// Candidates and counts are read in one read-only repeatable-read transaction,
    /// so a ballot committed mid-request shows up in both or in neither.
    pub async fn get_election_results(
        &self,
        election_id: Uuid,
    ) -> Result<ElectionResults, BallotError> {
        let txn = self
            .conn
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?;

        let election = election::Entity::find_by_id(election_id)
            .one(&txn)
            .await?
            .ok_or(BallotError::ElectionNotFound)?;

        let candidates: Vec<(Uuid, String)> = candidate::Entity::find()
            .filter(candidate::Column::ElectionId.eq(election_id))
            .select_only()
            .column(candidate::Column::Id)
            .column(candidate::Column::Name)
            .into_tuple()
            .all(&txn)
            .await?;

        // SELECT candidate_id, COUNT(id) FROM votes WHERE election_id = ? GROUP BY candidate_id
        let counts: Vec<(Uuid, i64)> = vote::Entity::find()
            .filter(vote::Column::ElectionId.eq(election_id))
            .select_only()
            .column(vote::Column::CandidateId)
            .column_as(
                Expr::expr(Func::count(Expr::col(vote::Column::Id))),
                "vote_count",
            )
            .group_by(vote::Column::CandidateId)
            .into_tuple()
            .all(&txn)
            .await?;

        let eligible_voters = BallotService::new(&txn, self.eligibility)
            .eligible_voter_count(election_id)
            .await?;

        txn.commit().await?;

        let tally = Tally::from_counts(
            candidates,
            counts
                .into_iter()
                .map(|(id, count)| (id, u64::try_from(count).unwrap_or(0))),
        );

        Ok(ElectionResults {
            election,
            tally,
            eligible_voters,
        })
    }
}
