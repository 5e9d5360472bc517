//! threads-server: data layer and HTTP API for a threads-style social app
//!
//! Users create a profile, post top-level threads (optionally in a
//! community), reply to threads, browse a paginated feed and search other
//! users. Records live in Postgres, or in an in-process store when no
//! database is configured.
//!
//! Layers, leaves first:
//! - [`db`] / [`store`]: connector and stores
//! - [`actions`]: validated operations with revalidation signals
//! - [`pages`]: page-shaped reads with the onboarding gate
//! - [`http`]: axum JSON API

pub mod actions;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod pages;
pub mod revalidate;
pub mod state;
pub mod store;

pub use actions::Actions;
pub use config::StoreConfig;
pub use error::{Error, Result, StoreError};
pub use state::AppState;
