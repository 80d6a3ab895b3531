use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::Tunables;
use crate::engine::ScrollTuning;

pub mod evdev;
pub mod event_loop;

/// Run the evdev backend with the full event loop
///
/// # Arguments
/// * `backend` - Opened devices and virtual pointer (the interception point)
/// * `tunables` - Settings read from the preference store
/// * `quit` - Raised by the signal handler to stop the loop
pub fn run_evdev(
    backend: evdev::EvdevBackend,
    tunables: Tunables,
    quit: Arc<AtomicBool>,
) -> Result<()> {
    event_loop::run(backend, tunables, ScrollTuning::default(), quit)
}
