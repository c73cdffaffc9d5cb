pub mod bus;
pub mod notice;
pub mod types;
