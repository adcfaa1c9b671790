//! Battery voltage sampling on the SAADC.

use crate::status::BatteryLevel;
use defmt::debug;
use embassy_nrf::saadc::Saadc;

pub struct BatteryMonitor {
    saadc: Saadc<'static, 1>,
}

impl BatteryMonitor {
    /// Calibrate the converter once before the first sample.
    pub async fn new(saadc: Saadc<'static, 1>) -> Self {
        saadc.calibrate().await;
        Self { saadc }
    }

    pub async fn sample(&mut self) -> BatteryLevel {
        let mut buf = [0i16; 1];
        self.saadc.sample(&mut buf).await;
        let level = BatteryLevel::from_raw(buf[0]);
        debug!("battery raw={} {}mV", buf[0], level.millivolts);
        level
    }
}
