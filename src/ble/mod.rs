//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Server** - registers the HID-over-GATT service (keyboard and
//!    mouse input reports) and the Battery service.
//! 2. **Advertiser** - advertises while the link is enabled and serves
//!    one host connection at a time.
//! 3. **Devices** - `BleKeyboard` / `BleMouse` implement the device
//!    traits on top of the shared [`HidLink`].
//!
//! The keyboard and mouse share one BLE link, so restarting either one
//! restarts advertising for both.

pub mod devices;
pub mod server;

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::Connection;

pub use devices::{BleKeyboard, BleMouse};
pub use server::{ble_task, HidServer};

/// Connection and advertising state shared by the devices and the BLE task.
pub struct HidLink {
    connection: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>>,
    enabled: AtomicBool,
    changed: Signal<CriticalSectionRawMutex, ()>,
}

impl HidLink {
    pub const fn new() -> Self {
        Self {
            connection: Mutex::new(RefCell::new(None)),
            enabled: AtomicBool::new(false),
            changed: Signal::new(),
        }
    }

    pub fn connection(&self) -> Option<Connection> {
        self.connection.lock(|c| c.borrow().clone())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.lock(|c| c.borrow().is_some())
    }

    pub(crate) fn set_connection(&self, conn: Option<Connection>) {
        self.connection.lock(|c| *c.borrow_mut() = conn);
    }

    /// Allow advertising (no-op when already enabled).
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::AcqRel) {
            info!("BLE link enabled");
        }
        self.changed.signal(());
    }

    /// Stop advertising and drop the current host, if any.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        if let Some(conn) = self.connection() {
            let _ = conn.disconnect();
        }
        self.changed.signal(());
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Wait until `enable` or `disable` is called.
    pub(crate) async fn wait_changed(&self) {
        self.changed.wait().await
    }
}
