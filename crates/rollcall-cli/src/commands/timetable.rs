use clap::Subcommand;
use rollcall_core::{Day, RepScope, SessionDraft, SessionPatch};

use super::App;

#[derive(Subcommand)]
pub enum TimetableAction {
    /// List sessions (all, or only those in a rep's scope)
    List {
        /// Rep email; restricts the listing to that rep's saved scope
        #[arg(long)]
        rep: Option<String>,
    },
    /// Add a session inside the rep's saved scope
    Add {
        #[arg(long)]
        rep: String,
        /// Monday..Friday
        #[arg(long)]
        day: Day,
        /// e.g. "8:00 AM - 10:00 AM"
        #[arg(long)]
        slot: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        venue: String,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
    },
    /// Edit a session by id
    Update {
        #[arg(long)]
        rep: String,
        id: String,
        #[arg(long)]
        day: Option<Day>,
        #[arg(long)]
        slot: Option<String>,
        #[arg(long)]
        venue: Option<String>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lng: Option<f64>,
    },
    /// Delete a session by id
    Delete {
        #[arg(long)]
        rep: String,
        id: String,
    },
    /// Assign ids to legacy sessions that lack one
    Migrate,
    /// Delete every session
    Clear,
}

fn saved_scope(app: &App, email: &str) -> Result<RepScope, Box<dyn std::error::Error>> {
    let email = email.trim().to_lowercase();
    RepScope::load(&app.store, &email)
        .ok_or_else(|| format!("no saved scope for {email}; run `rep scope-set` first").into())
}

pub fn run(action: TimetableAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open()?;
    match action {
        TimetableAction::List { rep } => {
            let sessions: Vec<_> = match rep {
                Some(email) => {
                    let scope = saved_scope(&app, &email)?;
                    app.timetable.scoped(&scope).into_iter().cloned().collect()
                }
                None => app.timetable.items().to_vec(),
            };
            if sessions.is_empty() {
                println!("no timetable entries");
                return Ok(());
            }
            for s in sessions {
                println!(
                    "{}  {} {}  {}  {} ({}/{}/{})",
                    s.id, s.day, s.time_slot, s.course_code, s.venue, s.faculty, s.department,
                    s.level,
                );
            }
        }
        TimetableAction::Add {
            rep,
            day,
            slot,
            course,
            venue,
            lat,
            lng,
        } => {
            let scope = saved_scope(&app, &rep)?;
            let session = app.timetable.create(
                SessionDraft {
                    day,
                    time_slot: slot,
                    course_code: course,
                    venue,
                    gps_lat: lat,
                    gps_lng: lng,
                },
                &scope,
            )?;
            println!("added {} ({})", session.course_code, session.id);
        }
        TimetableAction::Update {
            rep,
            id,
            day,
            slot,
            venue,
            lat,
            lng,
        } => {
            let scope = saved_scope(&app, &rep)?;
            app.timetable.update(
                &id,
                SessionPatch {
                    day,
                    time_slot: slot,
                    venue,
                    gps_lat: lat,
                    gps_lng: lng,
                },
                &scope,
            )?;
            println!("updated {id}");
        }
        TimetableAction::Delete { rep, id } => {
            let scope = saved_scope(&app, &rep)?;
            app.timetable.delete(&id, &scope)?;
            println!("deleted {id}");
        }
        TimetableAction::Migrate => {
            let fixed = app.timetable.migrate_missing_ids();
            println!("assigned ids to {fixed} session(s)");
        }
        TimetableAction::Clear => {
            app.timetable.clear_all();
            println!("timetable cleared");
        }
    }
    Ok(())
}
