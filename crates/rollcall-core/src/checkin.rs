//! The check-in pipeline: identity, schedule, and location gates in order.
//!
//! Gate order is observable through the returned error and is fixed:
//! field presence, matric format, device binding, course lookup, time
//! window, distance (GPS only), duplicate. The first failing gate wins.

use chrono::{DateTime, Local, Utc};

use crate::geo::{self, AccuracyQuality, GeoFix};
use crate::identity::{self, IdentityGuard};
use crate::ledger::{AttendanceLedger, AttendanceRecord, CheckinError, MANUAL_OFFLINE};
use crate::schedule;
use crate::storage::Config;
use crate::timetable::{CourseSession, TimetableStore};

/// Student-entered check-in fields.
#[derive(Debug, Clone)]
pub struct CheckinRequest {
    pub student_name: String,
    pub matriculation: String,
    pub course_code: String,
}

/// A successful check-in.
#[derive(Debug, Clone)]
pub struct CheckinOutcome {
    pub record: AttendanceRecord,
    /// Rounded meters from the session point; `None` for manual captures.
    pub distance: Option<f64>,
    pub accuracy: AccuracyQuality,
    /// True when this check-in created or replaced the device binding.
    pub newly_bound: bool,
}

/// GPS check-in: all gates, including the geofence.
pub fn check_in_gps(
    req: &CheckinRequest,
    fix: &GeoFix,
    timetable: &TimetableStore,
    ledger: &mut AttendanceLedger,
    guard: &mut IdentityGuard,
    config: &Config,
    now: DateTime<Local>,
) -> Result<CheckinOutcome, CheckinError> {
    let course = common_gates(req, timetable, guard, config, now)?;

    let distance = geo::distance_meters(fix.latitude, fix.longitude, course.gps_lat, course.gps_lng);
    let radius = config.attendance.geofence_radius_m;
    if !(distance <= radius) {
        // NaN from a bad fix also lands here.
        return Err(CheckinError::OutOfRange { distance, radius });
    }

    if ledger.is_duplicate(&req.matriculation, &req.course_code, now) {
        return Err(CheckinError::Duplicate);
    }

    let record = AttendanceRecord {
        student_name: req.student_name.clone(),
        matriculation: req.matriculation.clone(),
        course_code: req.course_code.clone(),
        course_name: course.course_code.clone(),
        venue: course.venue.clone(),
        faculty: course.faculty.clone(),
        department: course.department.clone(),
        level: course.level.clone(),
        timestamp: now.with_timezone(&Utc).to_rfc3339(),
        gps_location: Some(fix.point()),
        distance: Some(distance.round()),
        status: None,
    };

    finish(record, fix.accuracy, ledger, guard, req, now)
}

/// Manual check-in: same gates minus the geofence, record tagged
/// `manual-offline` with no location.
pub fn check_in_manual(
    req: &CheckinRequest,
    timetable: &TimetableStore,
    ledger: &mut AttendanceLedger,
    guard: &mut IdentityGuard,
    config: &Config,
    now: DateTime<Local>,
) -> Result<CheckinOutcome, CheckinError> {
    let course = common_gates(req, timetable, guard, config, now)?;

    if ledger.is_duplicate(&req.matriculation, &req.course_code, now) {
        return Err(CheckinError::Duplicate);
    }

    let record = AttendanceRecord {
        student_name: req.student_name.clone(),
        matriculation: req.matriculation.clone(),
        course_code: req.course_code.clone(),
        course_name: course.course_code.clone(),
        venue: course.venue.clone(),
        faculty: course.faculty.clone(),
        department: course.department.clone(),
        level: course.level.clone(),
        timestamp: now.with_timezone(&Utc).to_rfc3339(),
        gps_location: None,
        distance: None,
        status: Some(MANUAL_OFFLINE.to_string()),
    };

    finish(record, f64::NAN, ledger, guard, req, now)
}

fn common_gates<'a>(
    req: &CheckinRequest,
    timetable: &'a TimetableStore,
    guard: &IdentityGuard,
    config: &Config,
    now: DateTime<Local>,
) -> Result<&'a CourseSession, CheckinError> {
    if req.student_name.trim().is_empty()
        || req.matriculation.trim().is_empty()
        || req.course_code.trim().is_empty()
    {
        return Err(CheckinError::MissingFields);
    }
    if !identity::is_valid_matric(&req.matriculation) {
        return Err(CheckinError::InvalidMatricFormat);
    }
    if !guard.check_allowed(&req.matriculation) {
        let bound = guard
            .binding()
            .map(|b| b.matriculation.clone())
            .unwrap_or_default();
        return Err(CheckinError::DeviceBound(bound));
    }

    let course = timetable
        .find_by_course(&req.course_code)
        .ok_or(CheckinError::CourseNotFound)?;

    if !schedule::is_open(
        Some(course.time_slot.as_str()),
        Some(course.day),
        now,
        config.attendance.enforce_time_window,
    ) {
        return Err(CheckinError::WindowClosed);
    }

    Ok(course)
}

fn finish(
    record: AttendanceRecord,
    accuracy: f64,
    ledger: &mut AttendanceLedger,
    guard: &mut IdentityGuard,
    req: &CheckinRequest,
    now: DateTime<Local>,
) -> Result<CheckinOutcome, CheckinError> {
    let distance = record.distance;
    ledger.append(record.clone());

    // First successful check-in of the day binds the device.
    let needs_bind = guard
        .binding()
        .map(|b| b.matriculation != req.matriculation)
        .unwrap_or(true);
    if needs_bind {
        if let Err(e) = guard.bind(&req.matriculation, &req.student_name, now.with_timezone(&Utc)) {
            tracing::warn!(error = %e, "device binding could not be persisted");
        }
    }

    Ok(CheckinOutcome {
        record,
        distance,
        accuracy: AccuracyQuality::classify(accuracy),
        newly_bound: needs_bind,
    })
}
