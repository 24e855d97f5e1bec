mod repository;

pub use repository::*;

/// SQL migration for the record store schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Number of rows returned by an unfiltered listing.
pub const DEFAULT_LIST_LIMIT: i64 = 10;
