pub mod checkin;
pub mod config;
pub mod device;
pub mod rep;
pub mod summary;
pub mod sync;
pub mod timetable;

use std::sync::Arc;

use rollcall_core::{
    AttendanceLedger, Config, IdentityGuard, LocalStore, SyncReconciler, TimetableStore,
};

/// Everything a command needs, opened from the default data directory with
/// the sync sink wired when sync is enabled.
pub(crate) struct App {
    pub store: LocalStore,
    pub config: Config,
    pub timetable: TimetableStore,
    pub ledger: AttendanceLedger,
    pub guard: IdentityGuard,
    pub reconciler: Arc<SyncReconciler>,
}

impl App {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let store = LocalStore::open_default()?;
        let config = Config::load_or_default();
        let reconciler = Arc::new(SyncReconciler::from_config(&config.sync)?);

        let mut timetable = TimetableStore::load(
            store.clone(),
            config.attendance.allow_any_time_slot_format,
        );
        let mut ledger = AttendanceLedger::load(store.clone());
        if reconciler.is_enabled() {
            timetable.attach_sink(reconciler.clone());
            ledger.attach_sink(reconciler.clone());
        }
        let guard = IdentityGuard::load(store.clone(), chrono::Utc::now());

        Ok(Self {
            store,
            config,
            timetable,
            ledger,
            guard,
            reconciler,
        })
    }
}
