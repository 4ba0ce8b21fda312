use std::collections::HashMap;

use clap::Subcommand;
use rollcall_core::storage::keys;

use super::App;

#[derive(Subcommand)]
pub enum SyncAction {
    /// Show sync configuration state
    Status,
    /// Fetch remote documents and reconcile into local state
    Pull,
    /// Push the local timetable, attendance, and rep pins
    Push,
}

pub fn run(action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open()?;
    match action {
        SyncAction::Status => {
            if app.reconciler.is_enabled() {
                println!("sync enabled against {}", app.config.sync.base_url);
            } else {
                println!("sync disabled");
            }
        }
        SyncAction::Pull => {
            app.reconciler
                .pull(&mut app.timetable, &mut app.ledger, &app.store)?;
            println!(
                "pulled: {} timetable entries, {} attendance records",
                app.timetable.items().len(),
                app.ledger.records().len(),
            );
        }
        SyncAction::Push => {
            if !app.reconciler.is_enabled() {
                return Err("sync is disabled in configuration".into());
            }
            app.reconciler.reconnect(&app.timetable, &app.ledger);
            let pins: HashMap<String, String> =
                app.store.get(keys::REP_PINS).unwrap_or_default();
            if !pins.is_empty() {
                app.reconciler.push_rep_pins(&pins);
            }
            println!(
                "pushed {} timetable entries and {} attendance records",
                app.timetable.items().len(),
                app.ledger.records().len(),
            );
        }
    }
    Ok(())
}
