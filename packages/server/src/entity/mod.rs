pub mod candidate;
pub mod election;
pub mod election_voter;
pub mod otp_challenge;
pub mod profile;
pub mod vote;
