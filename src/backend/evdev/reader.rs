// Blocking per-device reader threads feeding the event loop's channel.
use std::io;
use std::thread::{self, JoinHandle};

use calloop::channel::Sender;
use evdev::{Device, InputEvent};
use log::{debug, warn};

use super::router::{DeviceBatch, DeviceMessage, DeviceOrigin};

/// Spawns a thread that reads `device` until it disappears or the loop goes away.
///
/// The thread never touches engine state; it only ships batches to the loop,
/// followed by [`DeviceMessage::Gone`] when the device stops producing events.
pub fn spawn_reader(
    mut device: Device,
    origin: DeviceOrigin,
    sender: Sender<DeviceMessage>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("dragscroll-{:?}", origin).to_lowercase())
        .spawn(move || {
            loop {
                let events: Vec<InputEvent> = match device.fetch_events() {
                    Ok(events) => events.collect(),
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        warn!("Stopped reading {:?}: {}", origin, err);
                        if sender.send(DeviceMessage::Gone(origin)).is_err() {
                            debug!("Event loop closed before {:?} was reported gone", origin);
                        }
                        break;
                    }
                };
                if events.is_empty() {
                    continue;
                }
                if sender
                    .send(DeviceMessage::Batch(DeviceBatch { origin, events }))
                    .is_err()
                {
                    debug!("Event loop closed, reader {:?} exiting", origin);
                    break;
                }
            }
        })
}
