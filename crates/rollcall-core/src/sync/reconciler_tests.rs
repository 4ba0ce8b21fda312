//! Tests for reconciler merge and pull/push behavior.

#[cfg(test)]
mod tests {
    use crate::ledger::{AttendanceLedger, AttendanceRecord};
    use crate::storage::{keys, LocalStore, SyncConfig};
    use crate::sync::reconciler::{merge_attendance, SyncReconciler};
    use crate::sync::types::{SyncError, SyncTopic};
    use crate::timetable::TimetableStore;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn record(matric: &str, course: &str, timestamp: &str, name: &str) -> AttendanceRecord {
        AttendanceRecord {
            student_name: name.to_string(),
            matriculation: matric.to_string(),
            course_code: course.to_string(),
            course_name: course.to_string(),
            venue: "LT1".to_string(),
            faculty: "Science".to_string(),
            department: "CS".to_string(),
            level: "100".to_string(),
            timestamp: timestamp.to_string(),
            gps_location: None,
            distance: None,
            status: None,
        }
    }

    #[test]
    fn merge_local_wins_on_same_identity() {
        let remote = vec![record(
            "U2021/1234567",
            "CSC101",
            "2025-03-03T09:00:00+00:00",
            "Remote Copy",
        )];
        let local = vec![record(
            "U2021/1234567",
            "CSC101",
            "2025-03-03T10:30:00+00:00",
            "Local Copy",
        )];

        let merged = merge_attendance(remote, local);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].student_name, "Local Copy");
    }

    #[test]
    fn merge_keeps_distinct_records_from_both_sides() {
        let remote = vec![record(
            "U2021/1111111",
            "CSC101",
            "2025-03-03T09:00:00+00:00",
            "Remote Only",
        )];
        let local = vec![
            record(
                "U2021/2222222",
                "CSC101",
                "2025-03-03T09:00:00+00:00",
                "Local Only",
            ),
            // Same matric/course as remote but a different UTC day.
            record(
                "U2021/1111111",
                "CSC101",
                "2025-03-04T09:00:00+00:00",
                "Next Day",
            ),
        ];

        let merged = merge_attendance(remote, local);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].student_name, "Remote Only");
    }

    #[test]
    fn disabled_reconciler_refuses_pull_but_pushes_quietly() {
        let dir = TempDir::new().unwrap();
        let store = || LocalStore::at(dir.path().to_path_buf());
        let mut timetable = TimetableStore::load(store(), false);
        let mut ledger = AttendanceLedger::load(store());

        let reconciler = SyncReconciler::from_config(&SyncConfig::default()).unwrap();
        assert!(!reconciler.is_enabled());
        // Pushes are silent no-ops.
        reconciler.push_timetable(timetable.items());
        assert!(matches!(
            reconciler.pull(&mut timetable, &mut ledger, &store()),
            Err(SyncError::Disabled)
        ));
    }

    fn enabled(base_url: &str) -> SyncReconciler {
        SyncReconciler::from_config(&SyncConfig {
            enabled: true,
            base_url: base_url.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn pull_adopts_remote_timetable_and_merges_attendance() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/attendanceApp/timetable")
            .with_status(200)
            .with_body(
                json!({"items": [{
                    "id": "remote-1", "faculty": "Science", "department": "CS",
                    "level": "100", "day": "Monday",
                    "timeSlot": "8:00 AM - 10:00 AM", "courseCode": "CSC101",
                    "venue": "Remote Hall", "gpsLat": 6.5, "gpsLng": 3.4
                }]})
                .to_string(),
            )
            .create();
        server
            .mock("GET", "/attendanceApp/attendance")
            .with_status(200)
            .with_body(
                json!({"items": [{
                    "studentName": "Remote Student", "matriculation": "U2021/1111111",
                    "courseCode": "CSC101", "courseName": "CSC101", "venue": "LT1",
                    "faculty": "Science", "department": "CS", "level": "100",
                    "timestamp": "2025-03-03T09:00:00+00:00",
                    "gpsLocation": null, "distance": null
                }]})
                .to_string(),
            )
            .create();
        server
            .mock("GET", "/attendanceApp/repPins")
            .with_status(404)
            .create();

        let dir = TempDir::new().unwrap();
        let store = || LocalStore::at(dir.path().to_path_buf());
        let mut timetable = TimetableStore::load(store(), false);
        let mut ledger = AttendanceLedger::load(store());
        ledger.append(record(
            "U2021/2222222",
            "CSC101",
            "2025-03-03T09:30:00+00:00",
            "Local Student",
        ));

        enabled(&server.url())
            .pull(&mut timetable, &mut ledger, &store())
            .unwrap();

        assert_eq!(timetable.items().len(), 1);
        assert_eq!(timetable.items()[0].venue, "Remote Hall");
        assert_eq!(ledger.records().len(), 2);
        assert_eq!(ledger.records()[0].student_name, "Remote Student");
        assert_eq!(ledger.records()[1].student_name, "Local Student");
    }

    #[test]
    fn pull_ignores_empty_remote_timetable() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/attendanceApp/timetable")
            .with_status(200)
            .with_body(json!({"items": []}).to_string())
            .create();
        server
            .mock("GET", "/attendanceApp/attendance")
            .with_status(404)
            .create();
        server
            .mock("GET", "/attendanceApp/repPins")
            .with_status(404)
            .create();

        let dir = TempDir::new().unwrap();
        let store = || LocalStore::at(dir.path().to_path_buf());
        let seeded = store();
        seeded
            .put(
                keys::TIMETABLE,
                &json!([{
                    "id": "local-1", "faculty": "Science", "department": "CS",
                    "level": "100", "day": "Monday",
                    "timeSlot": "8:00 AM - 10:00 AM", "courseCode": "CSC101",
                    "venue": "LT1", "gpsLat": 6.5, "gpsLng": 3.4
                }]),
            )
            .unwrap();
        let mut timetable = TimetableStore::load(seeded, false);
        let mut ledger = AttendanceLedger::load(store());

        enabled(&server.url())
            .pull(&mut timetable, &mut ledger, &store())
            .unwrap();
        assert_eq!(timetable.items().len(), 1);
        assert_eq!(timetable.items()[0].venue, "LT1");
    }

    #[test]
    fn pull_unions_rep_pins_with_remote_winning() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/attendanceApp/timetable")
            .with_status(404)
            .create();
        server
            .mock("GET", "/attendanceApp/attendance")
            .with_status(404)
            .create();
        server
            .mock("GET", "/attendanceApp/repPins")
            .with_status(200)
            .with_body(json!({" Rep@X.edu ": " 9999 ", "new@x.edu": 1234}).to_string())
            .create();

        let dir = TempDir::new().unwrap();
        let store = || LocalStore::at(dir.path().to_path_buf());
        let seeded = store();
        seeded
            .put(
                keys::REP_PINS,
                &HashMap::from([
                    ("rep@x.edu".to_string(), "0000".to_string()),
                    ("kept@x.edu".to_string(), "5555".to_string()),
                ]),
            )
            .unwrap();
        let mut timetable = TimetableStore::load(store(), false);
        let mut ledger = AttendanceLedger::load(store());

        enabled(&server.url())
            .pull(&mut timetable, &mut ledger, &seeded)
            .unwrap();

        let pins: HashMap<String, String> = seeded.get(keys::REP_PINS).unwrap();
        assert_eq!(pins.get("rep@x.edu").map(String::as_str), Some("9999"));
        assert_eq!(pins.get("new@x.edu").map(String::as_str), Some("1234"));
        assert_eq!(pins.get("kept@x.edu").map(String::as_str), Some("5555"));
    }

    #[test]
    fn remote_attendance_snapshot_replaces_local() {
        let dir = TempDir::new().unwrap();
        let store = || LocalStore::at(dir.path().to_path_buf());
        let mut timetable = TimetableStore::load(store(), false);
        let mut ledger = AttendanceLedger::load(store());
        ledger.append(record(
            "U2021/2222222",
            "CSC101",
            "2025-03-03T09:30:00+00:00",
            "Local Student",
        ));

        let reconciler = SyncReconciler::from_config(&SyncConfig::default()).unwrap();
        reconciler.apply_remote_update(
            SyncTopic::Attendance,
            &json!({"items": []}),
            &mut timetable,
            &mut ledger,
            &store(),
        );
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn push_attendance_writes_items_document() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/attendanceApp/attendance")
            .match_body(mockito::Matcher::PartialJson(json!({
                "items": [{"matriculation": "U2021/1234567", "courseCode": "CSC101"}]
            })))
            .with_status(200)
            .create();

        enabled(&server.url()).push_attendance(&[record(
            "U2021/1234567",
            "CSC101",
            "2025-03-03T09:00:00+00:00",
            "Ann",
        )]);
        mock.assert();
    }
}
