/// Daemon implementation: permission wait, device setup and the autoscroll loop
use anyhow::{Context, Result};
use log::{error, info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::backend;
use crate::backend::evdev::{EvdevBackend, EvdevTrust};
use crate::config::{TomlPreferences, Tunables};
use crate::host::TrustGate;
use crate::notification;

/// How often the permission state is re-checked while waiting for access.
const TRUST_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct Daemon {
    config_path: Option<PathBuf>,
    should_quit: Arc<AtomicBool>,
}

impl Daemon {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            should_quit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run until SIGINT/SIGTERM
    ///
    /// # Errors
    /// Fails when the devices cannot be intercepted or the event loop cannot be set up.
    pub fn run(&mut self) -> Result<()> {
        info!("Starting dragscroll daemon");

        let mut signals =
            Signals::new([SIGTERM, SIGINT]).context("Failed to register signal handler")?;
        let quit_flag = self.should_quit.clone();

        // Lives until process exit; `forever()` has no shutdown hook.
        thread::spawn(move || {
            for sig in signals.forever() {
                match sig {
                    SIGTERM | SIGINT => {
                        info!(
                            "Received {} - initiating graceful shutdown",
                            if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                        );
                        quit_flag.store(true, Ordering::Release);
                    }
                    _ => {
                        warn!("Received unexpected signal: {}", sig);
                    }
                }
            }
        });

        let gate = EvdevTrust::default();
        if !wait_until_trusted(&gate, TRUST_POLL_INTERVAL, &self.should_quit) {
            info!("Quit requested before input access was granted");
            return Ok(());
        }

        let tunables = load_tunables(self.config_path.as_deref())?;

        let backend = match EvdevBackend::open(&tunables) {
            Ok(backend) => backend,
            Err(err) => {
                error!("Failed to intercept input devices: {:#}", err);
                notification::notify_blocking(
                    "dragscroll could not start",
                    &format!("Failed to intercept input devices: {:#}", err),
                );
                return Err(err);
            }
        };

        backend::run_evdev(backend, tunables, self.should_quit.clone()).inspect_err(|err| {
            error!("Event loop failed: {:#}", err);
            notification::notify_blocking(
                "dragscroll stopped",
                &format!("Event loop failed: {:#}", err),
            );
        })?;

        info!("Daemon shutting down");
        Ok(())
    }
}

/// Reads the preference store and resolves the tunables.
///
/// # Errors
/// Fails only when no configuration directory can be located.
pub fn load_tunables(config_path: Option<&std::path::Path>) -> Result<Tunables> {
    let store = TomlPreferences::load(config_path)?;
    Ok(Tunables::from_store(&store))
}

/// Blocks until `gate` reports trusted, prompting once.
///
/// Returns `false` if `quit` is raised first.
pub fn wait_until_trusted(gate: &impl TrustGate, poll: Duration, quit: &AtomicBool) -> bool {
    if gate.is_trusted() {
        return true;
    }

    warn!("Input device access is not granted yet");
    if gate.request_with_prompt() {
        info!("Input device access granted");
        return true;
    }

    info!("Waiting for input device access...");
    loop {
        if quit.load(Ordering::Acquire) {
            return false;
        }
        if gate.is_trusted() {
            info!("Input device access granted");
            return true;
        }
        thread::sleep(poll);
    }
}
