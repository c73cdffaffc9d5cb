pub mod correlation;
pub mod user;
