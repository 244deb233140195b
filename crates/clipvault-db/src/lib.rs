//! Clipvault Database Library
//!
//! Video metadata persistence behind the [`VideoRepository`] trait, with a PostgreSQL
//! implementation and an in-memory one for development and tests.

pub mod db;

pub use db::{run_migrations, InMemoryVideoRepository, PgVideoRepository, VideoRepository};
