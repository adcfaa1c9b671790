//! serial2ble - text commands in, BLE keyboard/mouse reports out.
//!
//! The library holds everything that can be tested on the host: the
//! command grammar, the bounded command queue, the dispatcher, the
//! connection monitor and the HID report builders. The BLE transport,
//! UART and SAADC glue only exist with the `embedded` feature.
//!
//! Usage: `cargo test --lib` (host), `cargo run --release --features embedded` (target).
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod hid;
pub mod line;
pub mod monitor;
pub mod parser;
pub mod queue;
pub mod runtime;
pub mod status;

#[cfg(feature = "embedded")]
pub mod battery;
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod serial;

pub use command::{Command, CommandKind, KeyCode, Modifiers, MouseButton, SpecialKey};
pub use device::{DeviceKind, HidDevices, KeyboardDevice, MouseDevice};
pub use dispatch::{DispatchOutcome, Dispatcher, DropReason};
pub use error::{DeviceError, Error, ParseError};
pub use monitor::{ConnectionMonitor, MonitorEvent, MonitorReport};
pub use parser::{parse, try_parse};
pub use queue::CommandQueue;
