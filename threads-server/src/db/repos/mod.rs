//! Postgres implementations of the store traits
//!
//! Each repository follows these patterns:
//! - Acquires the pool through the shared [`Connector`](crate::db::Connector)
//! - Handles conflicts via ON CONFLICT (no check-then-insert)
//! - Uses transactions for multi-record mutations

pub mod communities;
pub mod threads;
pub mod users;

pub use communities::PgCommunityStore;
pub use threads::PgThreadStore;
pub use users::PgUserStore;
