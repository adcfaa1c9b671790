//! `KeyboardDevice` / `MouseDevice` over the BLE HID link.
//!
//! Each primitive updates the local report state and notifies the
//! matching input report characteristic. A notification failure is
//! reported as `DeviceError::Transport`; the dispatcher drops the command.

use crate::ble::{HidLink, HidServer};
use crate::command::{KeyCode, MouseButton};
use crate::device::{KeyboardDevice, MouseDevice};
use crate::error::DeviceError;
use crate::hid::keyboard::KeyboardReport;
use crate::hid::mouse::{ButtonState, MouseReport};
use crate::hid::{HidReport, MAX_REPORT_SIZE};
use defmt::debug;
use nrf_softdevice::ble::gatt_server;

/// Notify one input report on its characteristic.
fn notify(link: &HidLink, server: &HidServer, report: HidReport) -> Result<(), DeviceError> {
    let conn = link.connection().ok_or(DeviceError::NotConnected)?;
    let mut buf = [0u8; MAX_REPORT_SIZE];
    let n = report.serialize(&mut buf);
    gatt_server::notify_value(&conn, server.input_handle(report.id()), &buf[..n]).map_err(|_| {
        debug!("HID notify failed ({})", report.id());
        DeviceError::Transport
    })
}

pub struct BleKeyboard {
    link: &'static HidLink,
    server: &'static HidServer,
    report: KeyboardReport,
}

impl BleKeyboard {
    pub const fn new(link: &'static HidLink, server: &'static HidServer) -> Self {
        Self {
            link,
            server,
            report: KeyboardReport::empty(),
        }
    }

    fn send(&self) -> Result<(), DeviceError> {
        notify(self.link, self.server, HidReport::Keyboard(self.report))
    }

    fn tap(&mut self, key: KeyCode) -> Result<(), DeviceError> {
        let (link, server) = (self.link, self.server);
        self.report
            .tap(key, |report| notify(link, server, HidReport::Keyboard(*report)))
    }
}

impl KeyboardDevice for BleKeyboard {
    fn begin(&mut self) -> Result<(), DeviceError> {
        self.report.release_all();
        self.link.enable();
        Ok(())
    }

    fn end(&mut self) {
        // Let the host see every key up before the link drops.
        if !self.report.is_empty() {
            self.report.release_all();
            let _ = self.send();
        }
        self.link.disable();
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    fn write(&mut self, key: KeyCode) -> Result<(), DeviceError> {
        self.tap(key)
    }

    fn press(&mut self, key: KeyCode) -> Result<(), DeviceError> {
        self.report.press(key)?;
        self.send()
    }

    fn release_all(&mut self) -> Result<(), DeviceError> {
        self.report.release_all();
        self.send()
    }

    fn print(&mut self, text: &str) -> Result<(), DeviceError> {
        for byte in text.bytes() {
            self.tap(KeyCode(byte))?;
        }
        Ok(())
    }
}

pub struct BleMouse {
    link: &'static HidLink,
    server: &'static HidServer,
    buttons: ButtonState,
}

impl BleMouse {
    pub const fn new(link: &'static HidLink, server: &'static HidServer) -> Self {
        Self {
            link,
            server,
            buttons: ButtonState::new(),
        }
    }

    fn send(&self, report: MouseReport) -> Result<(), DeviceError> {
        notify(self.link, self.server, HidReport::Mouse(report))
    }
}

impl MouseDevice for BleMouse {
    fn begin(&mut self) -> Result<(), DeviceError> {
        self.buttons = ButtonState::new();
        self.link.enable();
        Ok(())
    }

    fn end(&mut self) {
        if self.buttons.bits() != 0 {
            self.buttons = ButtonState::new();
            let _ = self.send(MouseReport::empty());
        }
        self.link.disable();
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    fn move_by(&mut self, dx: i8, dy: i8, wheel: i8) -> Result<(), DeviceError> {
        self.send(self.buttons.motion(dx, dy, wheel))
    }

    fn click(&mut self, button: MouseButton) -> Result<(), DeviceError> {
        for report in self.buttons.click(button) {
            self.send(report)?;
        }
        Ok(())
    }

    fn press(&mut self, button: MouseButton) -> Result<(), DeviceError> {
        let report = self.buttons.press(button);
        self.send(report)
    }

    fn release(&mut self, button: MouseButton) -> Result<(), DeviceError> {
        let report = self.buttons.release(button);
        self.send(report)
    }
}
