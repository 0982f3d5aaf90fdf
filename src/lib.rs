//! # Pressbase
//!
//! Persistence core for a blog/CMS: versioned SQLite schema with migrations,
//! a trait-based record store, baseline seeding, credential handling, and
//! JSON backup/restore. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! pressbase = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use pressbase::auth::PasswordHasher;
//! use pressbase::config::AppConfig;
//! use pressbase::store::SqliteStore;
//!
//! let config = AppConfig::from_env();
//! let store = SqliteStore::open(config.db_path()).unwrap();
//! pressbase::seed::run(&store, &PasswordHasher::new(), &config);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
pub mod backup;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod seed;
pub mod slug;
pub mod store;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;
