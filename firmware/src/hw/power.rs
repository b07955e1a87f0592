//! USB rail sampling through the RP2040 ADC.
//!
//! The rail reaches GP28 through a 3:1 divider; GP29, the usual VSYS
//! sense pin, is shared with the CYW43 SPI clock on the Pico W and cannot
//! be sampled while Wi-Fi is up.

use alarm_core::sampling::{AdcScaling, SupplyRail};
use embassy_rp::adc::{Adc, Blocking, Channel};

/// Blocking ADC reader implementing [`SupplyRail`].
pub struct UsbRailAdc<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
    scaling: AdcScaling,
}

impl<'d> UsbRailAdc<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self {
            adc,
            channel,
            scaling: AdcScaling::default(),
        }
    }
}

impl SupplyRail for UsbRailAdc<'_> {
    fn read_supply_voltage(&mut self) -> Option<f32> {
        match self.adc.blocking_read(&mut self.channel) {
            Ok(raw) => Some(self.scaling.to_volts(raw)),
            Err(_) => {
                defmt::warn!("power: ADC conversion failed");
                None
            }
        }
    }
}
