pub mod election;
pub mod hash;
pub mod jwt;
pub mod otp;
pub mod query;
