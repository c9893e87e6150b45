//! # Tagnest
//!
//! A self-hostable notes-and-tags server, usable both as a standalone binary
//! and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! tagnest = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use tagnest::server::{AppState, create_router};
//! use tagnest::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/tagnest.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     data_dir: PathBuf::from("./data"),
//!     require_terms: false,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod tree;
pub mod types;
