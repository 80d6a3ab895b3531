use clap::{ArgAction, Parser};
use std::path::PathBuf;

use dragscroll::backend::evdev::devices;
use dragscroll::daemon;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DRAGSCROLL_GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "dragscroll")]
#[command(version = VERSION, about = "Pointer-driven autoscroll for Linux input devices")]
struct Cli {
    /// Read preferences from PATH instead of ~/.config/dragscroll/config.toml
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective settings and exit without touching devices
    #[arg(long, action = ArgAction::SetTrue)]
    check: bool,

    /// List detected pointers and keyboards and exit
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "check")]
    list_devices: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.check {
        let tunables = daemon::load_tunables(cli.config.as_deref())?;
        let keys = tunables.modifiers.names();
        println!("button: {}", tunables.button_number());
        println!(
            "keys: {}",
            if keys.is_empty() {
                "(disabled)".to_string()
            } else {
                keys.join(", ")
            }
        );
        println!("speed: {}", tunables.speed);
        return Ok(());
    }

    if cli.list_devices {
        let found = devices::discover();
        if found.is_empty() {
            println!("No readable pointer or keyboard devices found.");
            println!("Check that your user can read /dev/input/event*.");
        }
        for device in found {
            println!("{:<9} {}  {}", device.role, device.path.display(), device.name);
        }
        return Ok(());
    }

    let mut daemon = daemon::Daemon::new(cli.config);
    daemon.run()?;

    log::info!("dragscroll exited.");
    Ok(())
}
