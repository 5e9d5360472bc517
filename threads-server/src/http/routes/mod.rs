//! Route handlers organized by resource

pub mod communities;
pub mod feed;
pub mod health;
pub mod search;
pub mod threads;
pub mod users;
