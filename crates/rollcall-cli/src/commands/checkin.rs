use chrono::{Local, Utc};
use clap::Subcommand;
use rollcall_core::{check_in_gps, check_in_manual, CheckinRequest, GeoFix};

use super::App;

#[derive(Subcommand)]
pub enum CheckinAction {
    /// GPS-verified check-in
    Gps {
        /// Student name
        #[arg(long)]
        name: String,
        /// Matric number, e.g. U2021/5570123
        #[arg(long)]
        matric: String,
        /// Course code from the timetable
        #[arg(long)]
        course: String,
        /// Current latitude
        #[arg(long)]
        lat: f64,
        /// Current longitude
        #[arg(long)]
        lng: f64,
        /// Reported fix accuracy in meters
        #[arg(long, default_value_t = 15.0)]
        accuracy: f64,
    },
    /// Manual check-in without a location fix
    Manual {
        #[arg(long)]
        name: String,
        #[arg(long)]
        matric: String,
        #[arg(long)]
        course: String,
    },
}

pub fn run(action: CheckinAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open()?;
    match action {
        CheckinAction::Gps {
            name,
            matric,
            course,
            lat,
            lng,
            accuracy,
        } => {
            let request = CheckinRequest {
                student_name: name,
                matriculation: matric,
                course_code: course,
            };
            let fix = GeoFix {
                latitude: lat,
                longitude: lng,
                accuracy,
                timestamp: Utc::now(),
            };
            let outcome = check_in_gps(
                &request,
                &fix,
                &app.timetable,
                &mut app.ledger,
                &mut app.guard,
                &app.config,
                Local::now(),
            )?;
            println!(
                "attendance marked for {} at {} ({:.0}m away, GPS {})",
                outcome.record.course_code,
                outcome.record.venue,
                outcome.distance.unwrap_or_default(),
                outcome.accuracy.label(),
            );
            if outcome.newly_bound {
                println!("this device is now locked to {} for today", request.matriculation);
            }
        }
        CheckinAction::Manual {
            name,
            matric,
            course,
        } => {
            let request = CheckinRequest {
                student_name: name,
                matriculation: matric,
                course_code: course,
            };
            let outcome = check_in_manual(
                &request,
                &app.timetable,
                &mut app.ledger,
                &mut app.guard,
                &app.config,
                Local::now(),
            )?;
            println!(
                "manual attendance recorded for {} at {}",
                outcome.record.course_code, outcome.record.venue,
            );
            if outcome.newly_bound {
                println!("this device is now locked to {} for today", request.matriculation);
            }
        }
    }
    Ok(())
}
