use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rollcall-cli", version, about = "Rollcall CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark attendance
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
    /// Timetable management (course rep)
    Timetable {
        #[command(subcommand)]
        action: commands::timetable::TimetableAction,
    },
    /// Device binding
    Device {
        #[command(subcommand)]
        action: commands::device::DeviceAction,
    },
    /// Course rep session and scope
    Rep {
        #[command(subcommand)]
        action: commands::rep::RepAction,
    },
    /// Daily attendance summary
    Summary {
        /// Summary date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Restrict to one course code
        #[arg(long)]
        course: Option<String>,
    },
    /// Remote sync
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Checkin { action } => commands::checkin::run(action),
        Commands::Timetable { action } => commands::timetable::run(action),
        Commands::Device { action } => commands::device::run(action),
        Commands::Rep { action } => commands::rep::run(action),
        Commands::Summary { date, course } => commands::summary::run(date, course),
        Commands::Sync { action } => commands::sync::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
