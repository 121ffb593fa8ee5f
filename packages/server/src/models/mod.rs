pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod dashboard;
pub mod election;
pub mod results;
pub mod shared;
pub mod voter;
