//! Library exports for the dragscroll autoscroll daemon.
//!
//! The engine and its collaborator traits are host-independent; the evdev
//! backend and daemon wire them to Linux input devices. The configuration
//! types are exported so tools can share schema and validation code with the
//! main binary.

pub mod backend;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod host;
pub mod input;
pub mod notification;

pub use config::Config;
