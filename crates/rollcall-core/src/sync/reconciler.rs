//! Reconciliation between the local stores and the shared remote documents.
//!
//! Pushes are best-effort: a failed push is logged and the local write
//! stands. Pulls merge attendance by record identity with local records
//! winning, replace the timetable wholesale when the remote copy is
//! non-empty, and union rep pins with remote entries winning.

use std::collections::HashMap;

use crate::ledger::{AttendanceLedger, AttendanceRecord};
use crate::rep::normalize_rep_pins;
use crate::storage::{keys, LocalStore, SyncConfig};
use crate::sync::document_client::DocumentClient;
use crate::sync::types::{attendance_key, SyncError, SyncSink, SyncTopic};
use crate::timetable::{CourseSession, TimetableStore};

pub struct SyncReconciler {
    client: Option<DocumentClient>,
}

impl SyncReconciler {
    /// Build from configuration; disabled (all operations no-ops or
    /// `Disabled` errors) when sync is off or no base URL is set.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = if config.enabled && !config.base_url.trim().is_empty() {
            Some(DocumentClient::new(&config.base_url)?)
        } else {
            None
        };
        Ok(Self { client })
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Write the full timetable document. Best-effort.
    pub fn push_timetable(&self, items: &[CourseSession]) {
        let Some(client) = &self.client else { return };
        let body = serde_json::json!({ "items": items });
        if let Err(e) = client.store(SyncTopic::Timetable, &body) {
            tracing::warn!(error = %e, "timetable push failed; local copy kept");
        }
    }

    /// Write the full attendance document. Best-effort.
    pub fn push_attendance(&self, records: &[AttendanceRecord]) {
        let Some(client) = &self.client else { return };
        let body = serde_json::json!({ "items": records });
        if let Err(e) = client.store(SyncTopic::Attendance, &body) {
            tracing::warn!(error = %e, "attendance push failed; local copy kept");
        }
    }

    /// Write the rep pin document (flat email -> pin map). Best-effort.
    pub fn push_rep_pins(&self, pins: &HashMap<String, String>) {
        let Some(client) = &self.client else { return };
        let body = serde_json::to_value(pins).unwrap_or_default();
        if let Err(e) = client.store(SyncTopic::RepPins, &body) {
            tracing::warn!(error = %e, "rep pin push failed; local copy kept");
        }
    }

    /// Startup pull: adopt the remote timetable when non-empty, merge
    /// attendance (local wins per record identity), union rep pins
    /// (remote wins per email).
    pub fn pull(
        &self,
        timetable: &mut TimetableStore,
        ledger: &mut AttendanceLedger,
        store: &LocalStore,
    ) -> Result<(), SyncError> {
        let client = self.client.as_ref().ok_or(SyncError::Disabled)?;

        if let Some(doc) = client.fetch(SyncTopic::Timetable)? {
            let remote = parse_items::<CourseSession>(&doc);
            if !remote.is_empty() {
                timetable.replace_all(remote);
            }
        }

        if let Some(doc) = client.fetch(SyncTopic::Attendance)? {
            let remote = parse_items::<AttendanceRecord>(&doc);
            let merged = merge_attendance(remote, ledger.records().to_vec());
            ledger.replace_all(merged);
        }

        if let Some(doc) = client.fetch(SyncTopic::RepPins)? {
            self.union_rep_pins(&doc, store);
        }

        Ok(())
    }

    /// Handle one remote change notification. Remote snapshots replace the
    /// matching local collection wholesale; pins are unioned.
    pub fn apply_remote_update(
        &self,
        topic: SyncTopic,
        payload: &serde_json::Value,
        timetable: &mut TimetableStore,
        ledger: &mut AttendanceLedger,
        store: &LocalStore,
    ) {
        match topic {
            SyncTopic::Timetable => {
                timetable.replace_all(parse_items::<CourseSession>(payload));
            }
            SyncTopic::Attendance => {
                ledger.replace_all(parse_items::<AttendanceRecord>(payload));
            }
            SyncTopic::RepPins => {
                self.union_rep_pins(payload, store);
            }
        }
    }

    /// After regaining connectivity, re-push both collections so the remote
    /// converges on local state.
    pub fn reconnect(&self, timetable: &TimetableStore, ledger: &AttendanceLedger) {
        self.push_timetable(timetable.items());
        self.push_attendance(ledger.records());
    }

    fn union_rep_pins(&self, payload: &serde_json::Value, store: &LocalStore) {
        let normalized = normalize_rep_pins(payload);
        if normalized.is_empty() {
            return;
        }
        let mut pins: HashMap<String, String> = store.get(keys::REP_PINS).unwrap_or_default();
        pins.extend(normalized);
        if let Err(e) = store.put(keys::REP_PINS, &pins) {
            tracing::warn!(error = %e, "failed to persist rep pins");
        }
    }
}

impl SyncSink for SyncReconciler {
    fn timetable_changed(&self, items: &[CourseSession]) {
        self.push_timetable(items);
    }

    fn attendance_changed(&self, records: &[AttendanceRecord]) {
        self.push_attendance(records);
    }
}

/// Extract and decode the `items` array of a collection document. Items
/// that fail to decode are dropped with a warning rather than poisoning
/// the whole document.
fn parse_items<T: serde::de::DeserializeOwned>(doc: &serde_json::Value) -> Vec<T> {
    let Some(items) = doc.get("items").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value(item.clone()) {
            Ok(parsed) => out.push(parsed),
            Err(e) => tracing::warn!(error = %e, "skipping undecodable remote item"),
        }
    }
    out
}

/// Merge two attendance collections by record identity. Remote records are
/// applied first, then local, so a local record with the same identity
/// replaces the remote copy in place; unmatched records from both sides
/// survive in arrival order.
pub fn merge_attendance(
    remote: Vec<AttendanceRecord>,
    local: Vec<AttendanceRecord>,
) -> Vec<AttendanceRecord> {
    let mut order: Vec<AttendanceRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in remote.into_iter().chain(local) {
        let key = attendance_key(&record);
        match index.get(&key) {
            Some(&i) => order[i] = record,
            None => {
                index.insert(key, order.len());
                order.push(record);
            }
        }
    }
    order
}
