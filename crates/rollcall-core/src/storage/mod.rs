//! Local persistence: data directory resolution and a JSON key-value store.
//!
//! Every collection in the app is one logical key mapped to one JSON file.
//! The in-memory copy and the persisted copy are kept as a single logical
//! value: owners write through on every mutation.

mod config;
mod local_store;

pub use config::{AttendanceConfig, Config, RepConfig, SyncConfig};
pub use local_store::LocalStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Well-known store keys. Shared with other clients of the same remote
/// documents, so the exact spellings matter.
pub mod keys {
    pub const TIMETABLE: &str = "timetableData";
    pub const ATTENDANCE: &str = "attendanceData";
    pub const STUDENT_PROFILE: &str = "studentProfile";
    pub const REP_PINS: &str = "repPins";
    pub const REP_SESSION: &str = "repSession";

    /// Per-rep scope key, e.g. `repScope:ann@university.edu`.
    pub fn rep_scope(email: &str) -> String {
        format!("repScope:{email}")
    }
}

/// Returns `~/.config/rollcall[-dev]/` based on ROLLCALL_ENV.
///
/// Set ROLLCALL_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ROLLCALL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("rollcall-dev")
    } else {
        base_dir.join("rollcall")
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
