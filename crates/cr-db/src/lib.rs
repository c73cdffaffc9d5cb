pub mod event_repo;
pub mod group_repo;
pub mod notice_repo;
pub mod registration_repo;
pub mod schema;
pub mod store;
pub mod util;


pub use crate::store::DbStore;
