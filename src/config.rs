//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, buffer sizes, and protocol constants live
//! here so they can be tuned in one place.

// Device identity

/// Name advertised over BLE and shown by the host.
pub const DEVICE_NAME: &str = "serial2ble HID";

/// Manufacturer string exposed through the Device Information service.
pub const MANUFACTURER: &str = "serial2ble";

/// Battery level reported before the first SAADC sample (percent).
pub const INITIAL_BATTERY_LEVEL: u8 = 100;

// Serial (UARTE0, 115200 8N1)

/// Longest accepted command line (bytes, excluding the terminator).
pub const MAX_LINE_LEN: usize = 128;

/// Longest text accepted by `type:` (characters).
pub const MAX_TEXT_LEN: usize = 32;

// Command pipeline

/// Slots in the serial → dispatcher command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Maximum wait for the shared device lock before a step is skipped (ms).
pub const LOCK_TIMEOUT_MS: u64 = 100;

/// Minimum spacing between two mouse movement reports (µs).
/// 8 ms keeps us under the 7.5 ms minimum BLE connection interval.
pub const MIN_REPORT_INTERVAL_US: u64 = 8_000;

/// How long a modifier chord is held before release (ms).
pub const CHORD_HOLD_MS: u32 = 10;

/// Pause between the two clicks of a double click (ms).
pub const DOUBLE_CLICK_GAP_MS: u32 = 50;

// Connection monitor

/// Interval between connectivity polls (ms).
pub const MONITOR_POLL_MS: u64 = 100;

/// Minimum spacing between two transport restarts of the same device (ms).
pub const RECONNECT_COOLDOWN_MS: u64 = 5_000;

/// Both devices down this long triggers a full re-initialisation (ms).
pub const REINIT_TIMEOUT_MS: u64 = 30_000;

/// Pause between `end()` and `begin()` of a transport restart (ms).
pub const RESTART_SETTLE_MS: u32 = 100;

// Status reporting

/// Interval between periodic status lines (ms).
pub const STATUS_INTERVAL_MS: u64 = 5_000;

/// Longest status / error line written to the serial port.
pub const STATUS_LINE_LEN: usize = 96;

// Battery
//
// The cell is measured through a 1:2 resistor divider on AIN0 (P0.02).
// SAADC: 12-bit, internal 0.6 V reference, gain 1/6 → 3.6 V full scale.

/// SAADC full-scale input voltage (mV).
pub const ADC_FULL_SCALE_MV: u32 = 3_600;

/// SAADC resolution (counts).
pub const ADC_RESOLUTION: u32 = 4_096;

/// Battery divider ratio (cell voltage / pin voltage).
pub const BATTERY_DIVIDER: u32 = 2;

/// Below this the `B` marker is emitted (mV).
pub const BATTERY_LOW_MV: u32 = 3_300;

/// Cell voltage reported as 0 % (mV).
pub const BATTERY_EMPTY_MV: u32 = 3_000;

/// Cell voltage reported as 100 % (mV).
pub const BATTERY_FULL_MV: u32 = 4_200;

// BLE

/// Advertising interval (in 0.625 ms units). 50 = 31.25 ms.
pub const BLE_ADV_INTERVAL: u32 = 50;

/// Preferred connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms (lowest latency for HID).
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;
