//! Supply rail sampling and smoothing.
//!
//! The firmware reads the rail through a resistor divider into the ADC;
//! [`AdcScaling`] turns the raw count back into volts at the rail. The
//! [`SupplyRail`] trait is the seam the control loop samples through, so the
//! emulator can substitute a scripted voltage source.

mod filter;

pub use filter::MovingAverage;

/// Capability provider for supply rail readings.
pub trait SupplyRail {
    /// Returns the current rail voltage, or `None` when the reading failed.
    fn read_supply_voltage(&mut self) -> Option<f32>;
}

/// Reference voltage of the RP2040 ADC.
pub const DEFAULT_ADC_REFERENCE_VOLTS: f32 = 3.3;
/// Resolution of the RP2040 ADC.
pub const DEFAULT_ADC_RESOLUTION_BITS: u8 = 12;
/// Widest count a `u16` reading can carry.
pub const MAX_ADC_RESOLUTION_BITS: u8 = 16;
/// Ratio of the on-board VSYS divider.
pub const DEFAULT_DIVIDER_RATIO: f32 = 3.0;

/// Conversion from raw ADC counts to rail voltage.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AdcScaling {
    reference_volts: f32,
    resolution_bits: u8,
    divider_ratio: f32,
}

impl AdcScaling {
    /// Resolutions above [`MAX_ADC_RESOLUTION_BITS`] are clamped to it.
    #[must_use]
    pub const fn new(reference_volts: f32, resolution_bits: u8, divider_ratio: f32) -> Self {
        let resolution_bits = if resolution_bits > MAX_ADC_RESOLUTION_BITS {
            MAX_ADC_RESOLUTION_BITS
        } else {
            resolution_bits
        };
        Self {
            reference_volts,
            resolution_bits,
            divider_ratio,
        }
    }

    /// Converts a raw ADC count into volts at the rail.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_volts(&self, raw: u16) -> f32 {
        let full_scale = (1_u32 << self.resolution_bits) as f32;
        f32::from(raw) * self.reference_volts / full_scale * self.divider_ratio
    }
}

impl Default for AdcScaling {
    fn default() -> Self {
        Self::new(
            DEFAULT_ADC_REFERENCE_VOLTS,
            DEFAULT_ADC_RESOLUTION_BITS,
            DEFAULT_DIVIDER_RATIO,
        )
    }
}

/// Converts volts to whole millivolts for display and telemetry.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_millivolts(volts: f32) -> u16 {
    // Float-to-int casts saturate; NaN maps to zero.
    (volts * 1000.0) as u16
}
