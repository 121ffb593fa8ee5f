pub mod access;
pub mod election_status;
pub mod tally;

pub use access::{Access, RouteRequirement, SessionState};
pub use election_status::ElectionStatus;
pub use tally::{CandidateTally, Tally, percentage, turnout_percentage};
