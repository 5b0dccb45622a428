//! Client-side state for the ConsistentVideo pipeline
//!
//! This crate holds everything the user surface keeps between backend calls:
//!
//! - [`Store`] - observer-pattern cell with synchronous subscriber callbacks
//! - [`LogStore`] - capped ledger of API requests (most recent first)
//! - [`ProjectStateStore`] - project configuration mirrored to [`DurableStorage`]
//! - [`UiState`] - independent cells for entities, scenes, cuts, media paths and flags
//!
//! ## Construction order
//!
//! Storage first, then the project store (it hydrates from storage), then the
//! log store and the UI cells. The API client takes the log store by value;
//! every store is a cheap `Clone` handle over shared state.
//!
//! ```no_run
//! use std::sync::Arc;
//! use cv_state::{FileStorage, LogStore, ProjectStateStore, UiState};
//!
//! let storage = Arc::new(FileStorage::new(".cv-state"));
//! let project = ProjectStateStore::new(storage);
//! let logs = LogStore::new();
//! let ui = UiState::default();
//! # let _ = (project, logs, ui);
//! ```

mod error;
mod logs;
mod project;
mod storage;
mod store;
mod ui;

pub use error::StateError;
pub use logs::{LogStore, MAX_LOG_ENTRIES};
pub use project::{PROJECT_STATE_KEY, ProjectStateStore};
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
pub use store::{Store, Subscription};
pub use ui::{ERROR_DISPLAY, SUCCESS_DISPLAY, UiState};

pub use cv_types::{cut_id, parse_cut_id};
