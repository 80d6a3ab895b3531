// Permission check for reading /dev/input and writing /dev/uinput.
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use log::warn;

use crate::host::TrustGate;
use crate::notification;

pub const INPUT_DIR: &str = "/dev/input";
pub const UINPUT_PATH: &str = "/dev/uinput";

/// Trusted when the uinput node opens read-write and at least one event node is readable.
#[derive(Debug, Clone)]
pub struct EvdevTrust {
    input_dir: PathBuf,
    uinput: PathBuf,
}

impl Default for EvdevTrust {
    fn default() -> Self {
        Self::with_paths(INPUT_DIR, UINPUT_PATH)
    }
}

impl EvdevTrust {
    pub fn with_paths(input_dir: impl Into<PathBuf>, uinput: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            uinput: uinput.into(),
        }
    }
}

impl TrustGate for EvdevTrust {
    fn is_trusted(&self) -> bool {
        can_write(&self.uinput) && any_event_node_readable(&self.input_dir)
    }

    fn request_with_prompt(&self) -> bool {
        if self.is_trusted() {
            return true;
        }

        warn!(
            "dragscroll needs read access to {}/event* and read-write access to {}",
            self.input_dir.display(),
            self.uinput.display()
        );
        warn!("Add your user to the 'input' group or install a udev rule, then log in again");
        notification::notify_blocking(
            "dragscroll needs input device access",
            "Add your user to the 'input' group (or install a udev rule for /dev/uinput). \
             dragscroll will start as soon as access is granted.",
        );

        self.is_trusted()
    }
}

fn can_write(path: &Path) -> bool {
    OpenOptions::new().read(true).write(true).open(path).is_ok()
}

fn any_event_node_readable(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry.file_name().to_string_lossy().starts_with("event")
            && OpenOptions::new().read(true).open(entry.path()).is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_nodes(with_event: bool, with_uinput: bool) -> (TempDir, EvdevTrust) {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("input");
        fs::create_dir(&input).unwrap();
        if with_event {
            fs::write(input.join("event3"), b"").unwrap();
        }
        let uinput = temp.path().join("uinput");
        if with_uinput {
            fs::write(&uinput, b"").unwrap();
        }
        let gate = EvdevTrust::with_paths(input, uinput);
        (temp, gate)
    }

    #[test]
    fn trusted_when_both_nodes_accessible() {
        let (_temp, gate) = fake_nodes(true, true);
        assert!(gate.is_trusted());
        assert!(gate.request_with_prompt());
    }

    #[test]
    fn untrusted_without_uinput() {
        let (_temp, gate) = fake_nodes(true, false);
        assert!(!gate.is_trusted());
    }

    #[test]
    fn untrusted_without_event_nodes() {
        let (_temp, gate) = fake_nodes(false, true);
        assert!(!gate.is_trusted());
    }
}
