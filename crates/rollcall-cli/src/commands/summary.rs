use chrono::{Local, NaiveDate};
use rollcall_core::daily_summary;

use super::App;

pub fn run(date: Option<String>, course: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let date = match date {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{s}': {e}"))?,
        None => Local::now().date_naive(),
    };

    let summary = daily_summary(app.ledger.records(), date, course.as_deref());
    if summary.is_empty() {
        println!("no attendance recorded for {date}");
        return Ok(());
    }

    println!("attendance summary for {date}");
    for group in &summary.courses {
        println!("{} - {} student(s)", group.course_code, group.student_count());
        for record in &group.records {
            let distance = match record.distance {
                Some(d) => format!("{d:.0}m"),
                None => "N/A".to_string(),
            };
            println!(
                "  {} ({}) | {} | {} Level | {}",
                record.student_name,
                record.matriculation,
                record.department,
                record.level,
                distance,
            );
        }
    }
    println!("total: {} record(s)", summary.total_records());
    Ok(())
}
