//! Course-session timetable with rep-scoped CRUD.
//!
//! The store is the sole owner of the session collection: the in-memory
//! vector and the persisted snapshot are one logical value, and every
//! mutation writes through and notifies the sync sink.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::rep::RepScope;
use crate::schedule::{self, Day};
use crate::storage::{keys, LocalStore};
use crate::sync::SyncSink;

/// One scheduled course session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSession {
    /// Opaque unique id, assigned once at creation. Legacy snapshots may
    /// lack it; `migrate_missing_ids` backfills.
    #[serde(default)]
    pub id: String,
    pub faculty: String,
    pub department: String,
    pub level: String,
    pub day: Day,
    pub time_slot: String,
    pub course_code: String,
    pub venue: String,
    pub gps_lat: f64,
    pub gps_lng: f64,
}

/// Caller-supplied fields for a new session. Faculty/department/level are
/// accepted but always overwritten from the rep's scope.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub day: Day,
    pub time_slot: String,
    pub course_code: String,
    pub venue: String,
    pub gps_lat: f64,
    pub gps_lng: f64,
}

/// Editable fields for an existing session. Scope fields are not part of
/// the patch; they are re-derived from the rep's scope on every update.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub day: Option<Day>,
    pub time_slot: Option<String>,
    pub venue: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lng: Option<f64>,
}

/// Timetable mutation rejection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimetableError {
    #[error("set your rep profile and scope first")]
    ScopeRequired,

    #[error("this entry is outside your faculty, department, and level")]
    ScopeMismatch,

    #[error("no timetable entry with id '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),
}

/// Owner of the course-session collection.
pub struct TimetableStore {
    items: Vec<CourseSession>,
    store: LocalStore,
    sink: Option<Arc<dyn SyncSink>>,
    relaxed_slot_format: bool,
}

impl TimetableStore {
    /// Load the persisted timetable; a missing or corrupt snapshot starts
    /// empty.
    pub fn load(store: LocalStore, relaxed_slot_format: bool) -> Self {
        let items = store.get(keys::TIMETABLE).unwrap_or_default();
        Self {
            items,
            store,
            sink: None,
            relaxed_slot_format,
        }
    }

    /// Attach the outbound sync sink notified after each local mutation.
    pub fn attach_sink(&mut self, sink: Arc<dyn SyncSink>) {
        self.sink = Some(sink);
    }

    pub fn items(&self) -> &[CourseSession] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find_by_course(&self, course_code: &str) -> Option<&CourseSession> {
        self.items.iter().find(|s| s.course_code == course_code)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&CourseSession> {
        self.items.iter().find(|s| s.id == id)
    }

    /// Entries within the given rep scope (the rep management view).
    pub fn scoped(&self, scope: &RepScope) -> Vec<&CourseSession> {
        self.items
            .iter()
            .filter(|s| scope.matches(&s.faculty, &s.department, &s.level))
            .collect()
    }

    /// Create a session inside the rep's scope. The stored entry's
    /// faculty/department/level come from the scope regardless of any
    /// caller input.
    pub fn create(
        &mut self,
        draft: SessionDraft,
        scope: &RepScope,
    ) -> Result<CourseSession, TimetableError> {
        if !scope.is_complete() {
            return Err(TimetableError::ScopeRequired);
        }
        self.validate_fields(&draft.time_slot, &draft.course_code, &draft.venue)?;
        validate_gps(draft.gps_lat, draft.gps_lng)?;

        let session = CourseSession {
            id: Uuid::new_v4().to_string(),
            faculty: scope.faculty.clone(),
            department: scope.department.clone(),
            level: scope.level.clone(),
            day: draft.day,
            time_slot: draft.time_slot.trim().to_string(),
            course_code: draft.course_code.trim().to_string(),
            venue: draft.venue.trim().to_string(),
            gps_lat: draft.gps_lat,
            gps_lng: draft.gps_lng,
        };
        self.items.push(session.clone());
        self.persist_and_push();
        Ok(session)
    }

    /// Patch an existing entry. Both the existing entry and the patched
    /// result must sit inside the rep's scope; scope fields are pinned to
    /// the scope, never taken from the patch.
    pub fn update(
        &mut self,
        id: &str,
        patch: SessionPatch,
        scope: &RepScope,
    ) -> Result<(), TimetableError> {
        if !scope.is_complete() {
            return Err(TimetableError::ScopeRequired);
        }
        let idx = self
            .items
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| TimetableError::NotFound(id.to_string()))?;

        {
            let existing = &self.items[idx];
            if !scope.matches(&existing.faculty, &existing.department, &existing.level) {
                return Err(TimetableError::ScopeMismatch);
            }
        }

        let time_slot = patch
            .time_slot
            .as_deref()
            .unwrap_or(&self.items[idx].time_slot)
            .trim()
            .to_string();
        let venue = patch
            .venue
            .as_deref()
            .unwrap_or(&self.items[idx].venue)
            .trim()
            .to_string();
        let gps_lat = patch.gps_lat.unwrap_or(self.items[idx].gps_lat);
        let gps_lng = patch.gps_lng.unwrap_or(self.items[idx].gps_lng);

        self.validate_fields(&time_slot, &self.items[idx].course_code.clone(), &venue)?;
        validate_gps(gps_lat, gps_lng)?;

        let entry = &mut self.items[idx];
        if let Some(day) = patch.day {
            entry.day = day;
        }
        entry.time_slot = time_slot;
        entry.venue = venue;
        entry.gps_lat = gps_lat;
        entry.gps_lng = gps_lng;
        // Scope fields are re-derived, not caller-editable.
        entry.faculty = scope.faculty.clone();
        entry.department = scope.department.clone();
        entry.level = scope.level.clone();

        self.persist_and_push();
        Ok(())
    }

    /// Delete an entry inside the rep's scope.
    pub fn delete(&mut self, id: &str, scope: &RepScope) -> Result<(), TimetableError> {
        if !scope.is_complete() {
            return Err(TimetableError::ScopeRequired);
        }
        let idx = self
            .items
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| TimetableError::NotFound(id.to_string()))?;
        {
            let existing = &self.items[idx];
            if !scope.matches(&existing.faculty, &existing.department, &existing.level) {
                return Err(TimetableError::ScopeMismatch);
            }
        }
        self.items.remove(idx);
        self.persist_and_push();
        Ok(())
    }

    /// Backfill ids on legacy entries. Idempotent; persists and pushes only
    /// when something actually changed. Returns the number of entries fixed.
    pub fn migrate_missing_ids(&mut self) -> usize {
        let mut changed = 0;
        for item in &mut self.items {
            if item.id.is_empty() {
                item.id = Uuid::new_v4().to_string();
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist_and_push();
        }
        changed
    }

    /// Unconditional destructive wipe (explicit administrative action, not
    /// scope-limited).
    pub fn clear_all(&mut self) {
        self.items.clear();
        self.persist_and_push();
    }

    /// Replace the collection with a remote snapshot. Persists locally but
    /// does not push: echoing a remote-originated change back out would
    /// just bounce between replicas.
    pub fn replace_all(&mut self, items: Vec<CourseSession>) {
        self.items = items;
        self.persist();
    }

    fn validate_fields(
        &self,
        time_slot: &str,
        course_code: &str,
        venue: &str,
    ) -> Result<(), TimetableError> {
        if course_code.trim().is_empty() {
            return Err(TimetableError::Validation("course code is required".into()));
        }
        if venue.trim().is_empty() {
            return Err(TimetableError::Validation("venue is required".into()));
        }
        if time_slot.trim().is_empty() {
            return Err(TimetableError::Validation("time slot is required".into()));
        }
        if !self.relaxed_slot_format && !schedule::is_strict_slot_format(time_slot) {
            return Err(TimetableError::Validation(
                "time slot must look like: 8:00 AM - 10:00 AM".into(),
            ));
        }
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.store.put(keys::TIMETABLE, &self.items) {
            tracing::warn!(error = %e, "failed to persist timetable snapshot");
        }
    }

    fn persist_and_push(&self) {
        self.persist();
        if let Some(sink) = &self.sink {
            sink.timetable_changed(&self.items);
        }
    }
}

fn validate_gps(lat: f64, lng: f64) -> Result<(), TimetableError> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(TimetableError::Validation(
            "valid GPS coordinates are required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LocalStore {
        LocalStore::at(dir.path().to_path_buf())
    }

    fn eng_scope() -> RepScope {
        RepScope::new("Engineering", "EEE", "300")
    }

    fn draft(course: &str) -> SessionDraft {
        SessionDraft {
            day: Day::Monday,
            time_slot: "8:00 AM - 10:00 AM".to_string(),
            course_code: course.to_string(),
            venue: "LT1".to_string(),
            gps_lat: 6.5,
            gps_lng: 3.4,
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        timetable_pushes: Mutex<usize>,
        attendance_pushes: Mutex<usize>,
    }

    impl SyncSink for RecordingSink {
        fn timetable_changed(&self, _items: &[CourseSession]) {
            *self.timetable_pushes.lock().unwrap() += 1;
        }
        fn attendance_changed(&self, _records: &[crate::ledger::AttendanceRecord]) {
            *self.attendance_pushes.lock().unwrap() += 1;
        }
    }

    #[test]
    fn create_forces_scope_fields() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);

        let created = tt.create(draft("EEE301"), &eng_scope()).unwrap();
        assert_eq!(created.faculty, "Engineering");
        assert_eq!(created.department, "EEE");
        assert_eq!(created.level, "300");
        assert!(!created.id.is_empty());
    }

    #[test]
    fn create_requires_complete_scope() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);
        let incomplete = RepScope::new("Engineering", "", "300");
        assert_eq!(
            tt.create(draft("EEE301"), &incomplete),
            Err(TimetableError::ScopeRequired)
        );
        assert!(tt.is_empty());
    }

    #[test]
    fn create_validates_slot_format_unless_relaxed() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);
        let mut bad = draft("EEE301");
        bad.time_slot = "sometime in the morning".to_string();
        assert!(matches!(
            tt.create(bad.clone(), &eng_scope()),
            Err(TimetableError::Validation(_))
        ));

        let mut relaxed = TimetableStore::load(store(&dir), true);
        assert!(relaxed.create(bad, &eng_scope()).is_ok());
    }

    #[test]
    fn create_rejects_non_finite_gps() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);
        let mut bad = draft("EEE301");
        bad.gps_lat = f64::NAN;
        assert!(matches!(
            tt.create(bad, &eng_scope()),
            Err(TimetableError::Validation(_))
        ));
    }

    #[test]
    fn update_rejects_out_of_scope_entry() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);
        let id = tt
            .create(draft("ENG201"), &RepScope::new("Arts", "English", "200"))
            .unwrap()
            .id;

        let foreign = RepScope::new("Science", "CS", "100");
        let result = tt.update(&id, SessionPatch::default(), &foreign);
        assert_eq!(result, Err(TimetableError::ScopeMismatch));
    }

    #[test]
    fn update_repins_scope_and_applies_patch() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);
        let id = tt.create(draft("EEE301"), &eng_scope()).unwrap().id;

        let patch = SessionPatch {
            day: Some(Day::Friday),
            venue: Some("LT2".to_string()),
            ..Default::default()
        };
        tt.update(&id, patch, &eng_scope()).unwrap();

        let entry = tt.find_by_id(&id).unwrap();
        assert_eq!(entry.day, Day::Friday);
        assert_eq!(entry.venue, "LT2");
        assert_eq!(entry.faculty, "Engineering");
    }

    #[test]
    fn delete_respects_scope() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);
        let id = tt.create(draft("EEE301"), &eng_scope()).unwrap().id;

        let foreign = RepScope::new("Science", "CS", "100");
        assert_eq!(tt.delete(&id, &foreign), Err(TimetableError::ScopeMismatch));
        assert_eq!(tt.items().len(), 1);

        tt.delete(&id, &eng_scope()).unwrap();
        assert!(tt.is_empty());
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut tt = TimetableStore::load(store(&dir), false);
        assert!(matches!(
            tt.delete("missing", &eng_scope()),
            Err(TimetableError::NotFound(_))
        ));
    }

    #[test]
    fn snapshot_survives_reload() {
        let dir = TempDir::new().unwrap();
        {
            let mut tt = TimetableStore::load(store(&dir), false);
            tt.create(draft("EEE301"), &eng_scope()).unwrap();
        }
        let tt = TimetableStore::load(store(&dir), false);
        assert_eq!(tt.items().len(), 1);
        assert_eq!(tt.items()[0].course_code, "EEE301");
    }

    #[test]
    fn migrate_missing_ids_is_idempotent_and_lazy() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        // Simulate a legacy snapshot without ids.
        s.put(
            keys::TIMETABLE,
            &serde_json::json!([{
                "faculty": "Science", "department": "CS", "level": "100",
                "day": "Monday", "timeSlot": "8:00 AM - 10:00 AM",
                "courseCode": "CSC101", "venue": "LT1",
                "gpsLat": 6.5, "gpsLng": 3.4
            }]),
        )
        .unwrap();

        let sink = Arc::new(RecordingSink::default());
        let mut tt = TimetableStore::load(s, false);
        tt.attach_sink(sink.clone());

        assert_eq!(tt.migrate_missing_ids(), 1);
        assert!(!tt.items()[0].id.is_empty());
        assert_eq!(*sink.timetable_pushes.lock().unwrap(), 1);

        // Second pass changes nothing and pushes nothing.
        assert_eq!(tt.migrate_missing_ids(), 0);
        assert_eq!(*sink.timetable_pushes.lock().unwrap(), 1);
    }

    #[test]
    fn mutations_notify_sink() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut tt = TimetableStore::load(store(&dir), false);
        tt.attach_sink(sink.clone());

        let id = tt.create(draft("EEE301"), &eng_scope()).unwrap().id;
        tt.delete(&id, &eng_scope()).unwrap();
        assert_eq!(*sink.timetable_pushes.lock().unwrap(), 2);
    }

    #[test]
    fn replace_all_persists_without_pushing() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let mut tt = TimetableStore::load(store(&dir), false);
        tt.attach_sink(sink.clone());

        let mut session = CourseSession {
            id: "remote-1".to_string(),
            faculty: "Science".to_string(),
            department: "CS".to_string(),
            level: "100".to_string(),
            day: Day::Monday,
            time_slot: "8:00 AM - 10:00 AM".to_string(),
            course_code: "CSC101".to_string(),
            venue: "LT1".to_string(),
            gps_lat: 6.5,
            gps_lng: 3.4,
        };
        session.venue = "Remote Hall".to_string();
        tt.replace_all(vec![session]);

        assert_eq!(tt.items().len(), 1);
        assert_eq!(*sink.timetable_pushes.lock().unwrap(), 0);

        let reloaded = TimetableStore::load(store(&dir), false);
        assert_eq!(reloaded.items()[0].venue, "Remote Hall");
    }
}
