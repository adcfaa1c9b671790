//! serial2ble firmware entry point - nRF52840 + S140 SoftDevice.
//!
//! Wiring:
//! UARTE0 RX → line reader → command queue → dispatcher → BLE HID reports
//! connection monitor and status reporter run alongside on the same lock.

#![no_std]
#![no_main]

use defmt::{debug, info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::peripherals::UARTE0;
use embassy_nrf::saadc::{self, Saadc};
use embassy_nrf::uarte::{self, Uarte, UarteRx, UarteTx};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Instant, Timer};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use serial2ble::battery::BatteryMonitor;
use serial2ble::ble::{self, BleKeyboard, BleMouse, HidLink, HidServer};
use serial2ble::config;
use serial2ble::monitor::MonitorConfig;
use serial2ble::runtime::{self, DispatchStep, SharedDevices};
use serial2ble::serial::{self, report, Queue, StatusChannel};
use serial2ble::status::{BootMarker, StatusMessage, StatusReport};
use serial2ble::{
    ConnectionMonitor, DeviceKind, DispatchOutcome, Dispatcher, HidDevices, MonitorEvent,
};

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => uarte::InterruptHandler<peripherals::UARTE0>;
    SAADC => saadc::InterruptHandler;
});

type Devices = SharedDevices<CriticalSectionRawMutex, BleKeyboard, BleMouse>;

static QUEUE: Queue = Queue::new();
static STATUS: StatusChannel = Channel::new();
static LINK: HidLink = HidLink::new();
static SERVER: StaticCell<HidServer> = StaticCell::new();
static DEVICES: StaticCell<Devices> = StaticCell::new();

/// Grace period for the boot marker to leave the UART before a reset.
const RESET_DELAY_MS: u64 = 500;

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: &'static HidServer) -> ! {
    ble::ble_task(sd, server, &LINK).await
}

#[embassy_executor::task]
async fn serial_reader_task(rx: UarteRx<'static, UARTE0>) -> ! {
    serial::reader_task(rx, &QUEUE, &STATUS).await
}

#[embassy_executor::task]
async fn serial_writer_task(tx: UarteTx<'static, UARTE0>) -> ! {
    serial::writer_task(tx, &STATUS).await
}

#[embassy_executor::task]
async fn dispatch_task(devices: &'static Devices) -> ! {
    info!("dispatch task started");
    let mut dispatcher = Dispatcher::default();
    let mut delay = Delay;

    loop {
        let step = runtime::dispatch_next(
            &QUEUE,
            devices,
            &mut dispatcher,
            &mut delay,
            Instant::now().as_micros(),
            Timer::after_millis(config::LOCK_TIMEOUT_MS),
        )
        .await;

        match step {
            Ok(DispatchStep::Idle) => {
                QUEUE.wait_ready().await;
                continue;
            }
            Ok(DispatchStep::Dispatched {
                kind,
                outcome: DispatchOutcome::Sent,
            }) => debug!("sent {}", kind),
            Ok(DispatchStep::Dispatched {
                kind,
                outcome: DispatchOutcome::Dropped(reason),
            }) => debug!("dropped {}: {}", kind, reason),
            Err(e) => warn!("dispatch skipped: {}", e),
        }

        yield_now().await;
    }
}

fn log_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Connected(kind) => info!("{} connected", kind.name()),
        MonitorEvent::Disconnected(kind) => warn!("{} disconnected", kind.name()),
        MonitorEvent::RestartIssued(kind) => info!("{} restarted", kind.name()),
        MonitorEvent::RestartFailed(kind, e) => warn!("{} restart failed: {}", kind.name(), e),
        MonitorEvent::Reinitialized => info!("HID subsystem re-initialised"),
        MonitorEvent::ReinitFailed(e) => warn!("HID re-init failed: {}", e),
    }
}

#[embassy_executor::task]
async fn monitor_task(devices: &'static Devices) -> ! {
    info!("connection monitor started");
    let mut monitor =
        ConnectionMonitor::new(MonitorConfig::default(), Instant::now().as_millis());
    let mut delay = Delay;

    loop {
        let tick = runtime::monitor_tick(
            &mut monitor,
            devices,
            &mut delay,
            Instant::now().as_millis(),
            Timer::after_millis(config::LOCK_TIMEOUT_MS),
        )
        .await;

        match tick {
            Ok(report) => report.iter().for_each(log_event),
            Err(e) => warn!("monitor tick skipped: {}", e),
        }

        Timer::after_millis(config::MONITOR_POLL_MS).await;
    }
}

#[embassy_executor::task]
async fn status_task(
    sd: &'static Softdevice,
    server: &'static HidServer,
    devices: &'static Devices,
    mut battery: BatteryMonitor,
) -> ! {
    let mut low_reported = false;

    loop {
        let level = battery.sample().await;
        server.set_battery_level(sd, &LINK, level.percent());

        // One marker per low-battery episode.
        if level.is_low() && !low_reported {
            warn!("battery low: {}mV", level.millivolts);
            report(&STATUS, StatusMessage::Marker(BootMarker::BatteryLow));
        }
        low_reported = level.is_low();

        match runtime::lock_within(devices, Timer::after_millis(config::LOCK_TIMEOUT_MS)).await {
            Ok(guard) => {
                let status = StatusReport {
                    keyboard_connected: guard.is_connected(DeviceKind::Keyboard),
                    mouse_connected: guard.is_connected(DeviceKind::Mouse),
                    battery: Some(level),
                    queued: QUEUE.len(),
                };
                drop(guard);
                report(&STATUS, StatusMessage::Status(status));
            }
            Err(e) => debug!("status skipped: {}", e),
        }

        Timer::after_millis(config::STATUS_INTERVAL_MS).await;
    }
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: config::DEVICE_NAME.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Report a fatal boot failure, then reset.
async fn fail(marker: BootMarker) -> ! {
    report(&STATUS, StatusMessage::Marker(marker));
    Timer::after_millis(RESET_DELAY_MS).await;
    cortex_m::peripheral::SCB::sys_reset()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("serial2ble starting");

    // Priorities 0, 1 and 4 are reserved by the SoftDevice.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);
    interrupt::UARTE0_UART0.set_priority(Priority::P3);
    interrupt::SAADC.set_priority(Priority::P3);

    // ── Serial ──────────────────────────────────────────────────────────
    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let uart = Uarte::new(p.UARTE0, Irqs, p.P0_08, p.P0_06, uart_config);
    let (tx, rx) = uart.split();
    unwrap!(spawner.spawn(serial_writer_task(tx)));
    report(&STATUS, StatusMessage::Marker(BootMarker::Starting));

    // ── BLE ─────────────────────────────────────────────────────────────
    let sd = Softdevice::enable(&softdevice_config());
    let server = match HidServer::new(sd) {
        Ok(server) => SERVER.init(server),
        Err(_) => {
            warn!("GATT registration failed");
            fail(BootMarker::InitFailed).await
        }
    };
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(ble_task(sd, server)));

    let devices = DEVICES.init(Mutex::new(HidDevices::new(
        BleKeyboard::new(&LINK, server),
        BleMouse::new(&LINK, server),
    )));
    if let Err(e) = devices.lock().await.begin_all() {
        warn!("HID start failed: {}", e);
        fail(BootMarker::TransportFailed).await
    }

    // ── Battery ─────────────────────────────────────────────────────────
    let channel = saadc::ChannelConfig::single_ended(p.P0_02);
    let saadc = Saadc::new(p.SAADC, Irqs, saadc::Config::default(), [channel]);
    let battery = BatteryMonitor::new(saadc).await;

    unwrap!(spawner.spawn(serial_reader_task(rx)));
    unwrap!(spawner.spawn(dispatch_task(devices)));
    unwrap!(spawner.spawn(monitor_task(devices)));
    unwrap!(spawner.spawn(status_task(sd, server, devices, battery)));

    report(&STATUS, StatusMessage::Marker(BootMarker::Ready));
    info!("serial2ble ready");
}
