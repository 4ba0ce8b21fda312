use clap::Subcommand;

use super::App;

#[derive(Subcommand)]
pub enum DeviceAction {
    /// Show today's device binding, if any
    Show,
    /// Release the binding so another student can check in (rep action)
    Unbind,
}

pub fn run(action: DeviceAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::open()?;
    match action {
        DeviceAction::Show => match app.guard.binding() {
            Some(b) => println!(
                "bound to {} ({}) since {}",
                b.matriculation, b.student_name, b.date
            ),
            None => println!("device is not bound"),
        },
        DeviceAction::Unbind => {
            app.guard.unbind();
            println!("device binding cleared");
        }
    }
    Ok(())
}
