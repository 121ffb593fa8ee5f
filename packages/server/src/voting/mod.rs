//! Vote casting, tallying and election status upkeep.

mod ballot;
mod results;
pub mod status;

pub use ballot::BallotService;
pub use results::ElectionResults;

use sea_orm::DbErr;

/// Reasons a ballot operation can be refused.
#[derive(Debug, thiserror::Error)]
pub enum BallotError {
    #[error("election not found")]
    ElectionNotFound,
    #[error("election is outside its voting window")]
    ElectionNotActive,
    #[error("candidate does not belong to the election")]
    InvalidCandidate,
    #[error("voter is not enrolled in the election")]
    NotEligible,
    #[error("voter has already cast a ballot in the election")]
    AlreadyVoted,
    #[error(transparent)]
    Database(#[from] DbErr),
}
