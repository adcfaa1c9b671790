//! GATT server - HID-over-GATT and Battery services, plus the advertising
//! loop that hands connections to it.

use crate::ble::HidLink;
use crate::config;
use crate::hid::descriptor::{input_report_reference, HID_INFO, REPORT_MAP};
use crate::hid::keyboard::KEYBOARD_REPORT_SIZE;
use crate::hid::mouse::MOUSE_REPORT_SIZE;
use crate::hid::ReportId;
use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_time::Timer;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{peripheral, Connection, Uuid};
use nrf_softdevice::Softdevice;

const HID_SERVICE: Uuid = Uuid::new_16(0x1812);
const BATTERY_SERVICE: Uuid = Uuid::new_16(0x180F);
const DEVICE_INFORMATION_SERVICE: Uuid = Uuid::new_16(0x180A);

const HID_INFORMATION: Uuid = Uuid::new_16(0x2A4A);
const HID_REPORT_MAP: Uuid = Uuid::new_16(0x2A4B);
const HID_CONTROL_POINT: Uuid = Uuid::new_16(0x2A4C);
const HID_REPORT: Uuid = Uuid::new_16(0x2A4D);
const HID_PROTOCOL_MODE: Uuid = Uuid::new_16(0x2A4E);
const HID_REPORT_REFERENCE: Uuid = Uuid::new_16(0x2908);
const BATTERY_LEVEL: Uuid = Uuid::new_16(0x2A19);
const MANUFACTURER_NAME: Uuid = Uuid::new_16(0x2A29);
const PNP_ID: Uuid = Uuid::new_16(0x2A50);

/// PnP ID: USB-IF vendor source, VID 0x1915 (Nordic), PID 0xEEEE, version 1.0.
const PNP_ID_VALUE: [u8; 7] = [0x02, 0x15, 0x19, 0xEE, 0xEE, 0x00, 0x01];

/// Protocol Mode value for Report Protocol.
const PROTOCOL_MODE_REPORT: u8 = 0x01;

/// Retry delay after a failed advertising start (ms).
const ADVERTISE_RETRY_MS: u64 = 500;

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(
        ServiceList::Incomplete,
        &[ServiceUuid16::HUMAN_INTERFACE_DEVICE, ServiceUuid16::BATTERY],
    )
    .full_name(config::DEVICE_NAME)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_16(ServiceList::Complete, &[ServiceUuid16::HUMAN_INTERFACE_DEVICE])
    .build();

/// Attribute handles of the registered services.
pub struct HidServer {
    keyboard_input: u16,
    mouse_input: u16,
    control_point: u16,
    protocol_mode: u16,
    battery_level: u16,
}

impl HidServer {
    /// Register both services. Must run before the SoftDevice task starts
    /// serving connections.
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut hid = ServiceBuilder::new(sd, HID_SERVICE)?;

        hid.add_characteristic(
            HID_INFORMATION,
            Attribute::new(HID_INFO),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        hid.add_characteristic(
            HID_REPORT_MAP,
            Attribute::new(REPORT_MAP),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        let control_point = hid
            .add_characteristic(
                HID_CONTROL_POINT,
                Attribute::new([0u8]),
                Metadata::new(Properties::new().write_without_response()),
            )?
            .build();

        let protocol_mode = hid
            .add_characteristic(
                HID_PROTOCOL_MODE,
                Attribute::new([PROTOCOL_MODE_REPORT]),
                Metadata::new(Properties::new().read().write_without_response()),
            )?
            .build();

        let mut keyboard = hid.add_characteristic(
            HID_REPORT,
            Attribute::new([0u8; KEYBOARD_REPORT_SIZE]),
            Metadata::new(Properties::new().read().notify()),
        )?;
        keyboard.add_descriptor(
            HID_REPORT_REFERENCE,
            Attribute::new(input_report_reference(ReportId::Keyboard)),
        )?;
        let keyboard_input = keyboard.build();

        let mut mouse = hid.add_characteristic(
            HID_REPORT,
            Attribute::new([0u8; MOUSE_REPORT_SIZE]),
            Metadata::new(Properties::new().read().notify()),
        )?;
        mouse.add_descriptor(
            HID_REPORT_REFERENCE,
            Attribute::new(input_report_reference(ReportId::Mouse)),
        )?;
        let mouse_input = mouse.build();

        hid.build();

        let mut battery = ServiceBuilder::new(sd, BATTERY_SERVICE)?;
        let battery_level = battery
            .add_characteristic(
                BATTERY_LEVEL,
                Attribute::new([config::INITIAL_BATTERY_LEVEL]),
                Metadata::new(Properties::new().read().notify()),
            )?
            .build();
        battery.build();

        let mut dis = ServiceBuilder::new(sd, DEVICE_INFORMATION_SERVICE)?;
        dis.add_characteristic(
            MANUFACTURER_NAME,
            Attribute::new(config::MANUFACTURER.as_bytes()),
            Metadata::new(Properties::new().read()),
        )?
        .build();
        dis.add_characteristic(
            PNP_ID,
            Attribute::new(PNP_ID_VALUE),
            Metadata::new(Properties::new().read()),
        )?
        .build();
        dis.build();

        info!("GATT services registered (HID, Battery, Device Information)");

        Ok(Self {
            keyboard_input: keyboard_input.value_handle,
            mouse_input: mouse_input.value_handle,
            control_point: control_point.value_handle,
            protocol_mode: protocol_mode.value_handle,
            battery_level: battery_level.value_handle,
        })
    }

    /// Value handle of the input report characteristic for `id`.
    pub fn input_handle(&self, id: ReportId) -> u16 {
        match id {
            ReportId::Keyboard => self.keyboard_input,
            ReportId::Mouse => self.mouse_input,
        }
    }

    /// Update the Battery Level characteristic and notify the host.
    pub fn set_battery_level(&self, sd: &Softdevice, link: &HidLink, percent: u8) {
        if gatt_server::set_value(sd, self.battery_level, &[percent]).is_err() {
            warn!("battery level update failed");
            return;
        }
        if let Some(conn) = link.connection() {
            let _ = gatt_server::notify_value(&conn, self.battery_level, &[percent]);
        }
    }
}

impl gatt_server::Server for HidServer {
    type Event = ();

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if handle == self.control_point {
            info!("HID control point: {:?}", data);
        } else if handle == self.protocol_mode {
            info!("HID protocol mode: {:?}", data);
        }
        None
    }
}

/// Advertise while the link is enabled and serve one connection at a time.
///
/// Runs forever; must be spawned as a dedicated Embassy task.
pub async fn ble_task(
    sd: &'static Softdevice,
    server: &'static HidServer,
    link: &'static HidLink,
) -> ! {
    info!("BLE task started");

    let adv_config = peripheral::Config {
        interval: config::BLE_ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        if !link.is_enabled() {
            link.wait_changed().await;
            continue;
        }

        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        match select(
            peripheral::advertise_connectable(sd, adv, &adv_config),
            link.wait_changed(),
        )
        .await
        {
            Either::First(Ok(conn)) => {
                info!("BLE host connected");
                let _ = conn.set_conn_params(nrf_softdevice::raw::ble_gap_conn_params_t {
                    min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
                    max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
                    slave_latency: config::BLE_SLAVE_LATENCY,
                    conn_sup_timeout: config::BLE_SUP_TIMEOUT,
                });
                link.set_connection(Some(conn.clone()));
                let _ = gatt_server::run(&conn, server, |_| {}).await;
                link.set_connection(None);
                info!("BLE host disconnected");
            }
            Either::First(Err(_)) => {
                warn!("BLE advertising failed to start");
                Timer::after_millis(ADVERTISE_RETRY_MS).await;
            }
            // Enabled state changed; re-evaluate.
            Either::Second(()) => {}
        }
    }
}
