use std::collections::HashMap;

use chrono::Utc;
use clap::Subcommand;
use rollcall_core::storage::keys;
use rollcall_core::{verify_rep_access, RepScope, RepSession};

use super::App;

#[derive(Subcommand)]
pub enum RepAction {
    /// Open a rep session (PIN only required when configured)
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        pin: Option<String>,
    },
    /// Close the current rep session
    Logout,
    /// Save the (faculty, department, level) scope for a rep
    ScopeSet {
        /// Rep email; defaults to the logged-in session
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        faculty: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        level: String,
    },
    /// Show the saved scope for a rep
    ScopeShow {
        #[arg(long)]
        email: Option<String>,
    },
}

fn session_email(app: &App, email: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(email) = email {
        return Ok(email.trim().to_lowercase());
    }
    let session: Option<RepSession> = app.store.get(keys::REP_SESSION);
    session
        .map(|s| s.email)
        .ok_or_else(|| "no rep session; pass --email or run `rep login`".into())
}

pub fn run(action: RepAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    match action {
        RepAction::Login { email, pin } => {
            let pins: HashMap<String, String> =
                app.store.get(keys::REP_PINS).unwrap_or_default();
            let identity =
                verify_rep_access(email.as_deref(), pin.as_deref(), &pins, &app.config.rep)?;
            app.store.put(
                keys::REP_SESSION,
                &RepSession {
                    email: identity.clone(),
                    ts: Utc::now(),
                },
            )?;
            println!("rep session opened as {identity}");
        }
        RepAction::Logout => {
            app.store.remove(keys::REP_SESSION);
            println!("rep session closed");
        }
        RepAction::ScopeSet {
            email,
            faculty,
            department,
            level,
        } => {
            let email = session_email(&app, email)?;
            let scope = RepScope::new(&faculty, &department, &level);
            if !scope.is_complete() {
                return Err("faculty, department, and level are all required".into());
            }
            scope.save(&app.store, &email)?;
            println!("scope saved for {email}: {faculty} / {department} / {level}");
        }
        RepAction::ScopeShow { email } => {
            let email = session_email(&app, email)?;
            match RepScope::load(&app.store, &email) {
                Some(scope) => println!(
                    "{email}: {} / {} / {}",
                    scope.faculty, scope.department, scope.level
                ),
                None => println!("no saved scope for {email}"),
            }
        }
    }
    Ok(())
}
