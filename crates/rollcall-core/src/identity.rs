//! Daily device-to-student binding (anti-cheat).
//!
//! A device auto-binds to the first matriculation that successfully checks
//! in each day; thereafter only that matriculation may check in from the
//! device until a rep unbinds it or the calendar date changes. The guard
//! enforces the binding only; who may call `unbind` is the caller's
//! contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::{keys, LocalStore};

/// The binding persisted under `studentProfile`, one per device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceBinding {
    pub matriculation: String,
    pub student_name: String,
    /// Creation date, `YYYY-MM-DD` (UTC). The binding is valid only on
    /// this date; stale bindings are discarded lazily on load.
    pub date: String,
}

/// `YYYY-MM-DD` key for an instant, matching the stored binding date.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Validates the matriculation format: `U` + 4 digits + `/` + 7 digits.
pub fn is_valid_matric(matric: &str) -> bool {
    let bytes = matric.as_bytes();
    bytes.len() == 13
        && bytes[0] == b'U'
        && bytes[1..5].iter().all(u8::is_ascii_digit)
        && bytes[5] == b'/'
        && bytes[6..13].iter().all(u8::is_ascii_digit)
}

/// Owner of the current device binding.
#[derive(Debug)]
pub struct IdentityGuard {
    binding: Option<DeviceBinding>,
    store: LocalStore,
}

impl IdentityGuard {
    /// Load the persisted binding, discarding it if its date is not today.
    pub fn load(store: LocalStore, now: DateTime<Utc>) -> Self {
        let mut binding: Option<DeviceBinding> = store.get(keys::STUDENT_PROFILE);
        if let Some(b) = &binding {
            if b.date != day_key(now) {
                store.remove(keys::STUDENT_PROFILE);
                binding = None;
            }
        }
        Self { binding, store }
    }

    pub fn binding(&self) -> Option<&DeviceBinding> {
        self.binding.as_ref()
    }

    /// True if no binding exists or the binding matches `matric`.
    pub fn check_allowed(&self, matric: &str) -> bool {
        match &self.binding {
            Some(b) => b.matriculation == matric,
            None => true,
        }
    }

    /// Bind this device to a student for today, overwriting any previous
    /// binding, and persist.
    pub fn bind(
        &mut self,
        matriculation: &str,
        student_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let binding = DeviceBinding {
            matriculation: matriculation.to_string(),
            student_name: student_name.to_string(),
            date: day_key(now),
        };
        self.store.put(keys::STUDENT_PROFILE, &binding)?;
        self.binding = Some(binding);
        Ok(())
    }

    /// Clear the binding in memory and on disk (rep "unlock device").
    pub fn unbind(&mut self) {
        self.store.remove(keys::STUDENT_PROFILE);
        self.binding = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap()
    }

    fn store(dir: &TempDir) -> LocalStore {
        LocalStore::at(dir.path().to_path_buf())
    }

    #[test]
    fn matric_format() {
        assert!(is_valid_matric("U2021/5570123"));
        assert!(!is_valid_matric("U2021/557012"));
        assert!(!is_valid_matric("U20211/5570123"));
        assert!(!is_valid_matric("X2021/5570123"));
        assert!(!is_valid_matric("U2021-5570123"));
        assert!(!is_valid_matric(""));
    }

    #[test]
    fn unbound_device_allows_anyone() {
        let dir = TempDir::new().unwrap();
        let guard = IdentityGuard::load(store(&dir), now());
        assert!(guard.check_allowed("U2021/1234567"));
        assert!(guard.check_allowed("U2020/0000001"));
    }

    #[test]
    fn bound_device_allows_only_bound_matric() {
        let dir = TempDir::new().unwrap();
        let mut guard = IdentityGuard::load(store(&dir), now());
        guard.bind("U2021/1234567", "Ann", now()).unwrap();

        assert!(guard.check_allowed("U2021/1234567"));
        assert!(!guard.check_allowed("U2021/7654321"));
    }

    #[test]
    fn unbind_reopens_device() {
        let dir = TempDir::new().unwrap();
        let mut guard = IdentityGuard::load(store(&dir), now());
        guard.bind("U2021/1234567", "Ann", now()).unwrap();
        guard.unbind();

        assert!(guard.check_allowed("U2021/7654321"));
        // And the persisted copy is gone too.
        let reloaded = IdentityGuard::load(store(&dir), now());
        assert!(reloaded.binding().is_none());
    }

    #[test]
    fn binding_survives_reload_same_day() {
        let dir = TempDir::new().unwrap();
        let mut guard = IdentityGuard::load(store(&dir), now());
        guard.bind("U2021/1234567", "Ann", now()).unwrap();

        let reloaded = IdentityGuard::load(store(&dir), now());
        assert_eq!(
            reloaded.binding().unwrap().matriculation,
            "U2021/1234567"
        );
    }

    #[test]
    fn stale_binding_expires_on_load() {
        let dir = TempDir::new().unwrap();
        let mut guard = IdentityGuard::load(store(&dir), now());
        guard.bind("U2021/1234567", "Ann", now()).unwrap();

        let tomorrow = Utc.with_ymd_and_hms(2025, 3, 4, 8, 0, 0).unwrap();
        let reloaded = IdentityGuard::load(store(&dir), tomorrow);
        assert!(reloaded.binding().is_none());
        assert!(reloaded.check_allowed("U2021/7654321"));
    }
}
