//! Driver configuration
//!
//! Defaults reproduce the reference calibration: 868 MHz 50 kbps GFSK,
//! 252 byte packets, CRC-error and ignored packets flushed by the RF core,
//! carrier sense at -90 dBm over a 50.15 ms window.

use crate::commands::{ms_to_ticks, FsParams, SetupParams};
use crate::queue::MAX_PACKET_LENGTH;
use crate::rf::{Priority, RfParams};

/// Carrier sense window in radio timer ticks (50.15 ms).
pub const CS_END_TIME: u32 = (50_000 + 150) * 4;

/// Default carrier sense RSSI threshold in dBm.
pub const RSSI_THRESHOLD: i8 = -90;

/// Static driver configuration applied by [`Device::init`](crate::Device::init)
#[derive(Debug, Clone)]
pub struct Config {
    /// Session property table
    pub rf_params: RfParams,
    /// Radio setup run when the session opens
    pub setup: SetupParams,
    /// Synthesizer command posted after the session opens
    pub synth: FsParams,
    /// Priority for every command
    pub priority: Priority,
    /// Largest accepted packet, clamped to [`MAX_PACKET_LENGTH`]
    pub max_packet_length: u8,
    /// Let the RF core drop packets ignored by the address filter
    pub auto_flush_ignored: bool,
    /// Let the RF core drop packets with CRC error
    pub auto_flush_crc_err: bool,
    /// Carrier sense RSSI threshold in dBm
    pub rssi_threshold: i8,
    /// Carrier sense window in radio timer ticks
    pub cs_end_time: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rf_params: RfParams::default(),
            setup: SetupParams::default(),
            synth: FsParams::default(),
            priority: Priority::Normal,
            max_packet_length: MAX_PACKET_LENGTH as u8,
            auto_flush_ignored: true,
            auto_flush_crc_err: true,
            rssi_threshold: RSSI_THRESHOLD,
            cs_end_time: CS_END_TIME,
        }
    }
}

impl Config {
    /// Sets the carrier sense window from milliseconds.
    pub fn with_cs_window_ms(mut self, ms: u32) -> Self {
        self.cs_end_time = ms_to_ticks(ms);
        self
    }

    /// Sets the channel frequency used for both setup and synthesizer.
    pub fn with_frequency(mut self, mhz: u16, fract: u16) -> Self {
        self.setup.center_freq = mhz;
        self.synth.frequency = mhz;
        self.synth.fract_freq = fract;
        self
    }

    pub(crate) fn max_packet_length(&self) -> u8 {
        self.max_packet_length.min(MAX_PACKET_LENGTH as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_carrier_sense_window() {
        assert_eq!(CS_END_TIME, 200_600);
        assert_eq!(Config::default().cs_end_time, 200_600);
        assert_eq!(Config::default().rssi_threshold, -90);
    }

    #[test]
    fn max_packet_length_is_clamped() {
        let config = Config {
            max_packet_length: 255,
            ..Default::default()
        };
        assert_eq!(config.max_packet_length(), MAX_PACKET_LENGTH as u8);
    }

    #[test]
    fn builders() {
        let config = Config::default()
            .with_cs_window_ms(10)
            .with_frequency(915, 0x4000);
        assert_eq!(config.cs_end_time, 40_000);
        assert_eq!(config.setup.center_freq, 915);
        assert_eq!(config.synth.frequency, 915);
        assert_eq!(config.synth.fract_freq, 0x4000);
    }
}
