//! Radio setup and frequency synthesizer commands
//!
//! These run once when the session is opened. The setup command selects the
//! modulation and is handed to the RF core driver as part of the session; the
//! synthesizer command locks the PLL to the channel frequency.

use core::convert::Infallible;

use regiface::{Command, FromByteArray, NoParameters, ToByteArray};

use super::common::{Condition, ConditionRule, Trigger, TriggerType};
use super::DecodeError;

/// Modulation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModulationType {
    /// 2-FSK / GFSK
    Fsk = 1,
    /// Long range mode
    Lrm = 2,
    /// On-off keying
    Ook = 3,
}

impl TryFrom<u8> for ModulationType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Fsk),
            2 => Ok(Self::Lrm),
            3 => Ok(Self::Ook),
            invalid => Err(DecodeError::InvalidModulation(invalid)),
        }
    }
}

/// Largest deviation the modulation word can carry
pub const DEVIATION_MAX: u16 = 0x1FFF;

/// CMD_PROP_RADIO_DIV_SETUP parameters
///
/// # Byte Format (little endian)
/// `modulation[2], symbolRate[4], rxBw, preamConf, formatConf, txPower[2],
/// centerFreq[2], intFreq[2], loDivider`
///
/// `modulation` packs the type in bits 2:0 and the deviation (250 Hz steps)
/// in bits 15:3. `symbolRate` packs the prescaler in bits 3:0 and the rate
/// word in bits 24:4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupParams {
    /// Modulation type
    pub modulation: ModulationType,
    /// Frequency deviation in 250 Hz steps, 13 bits wide; higher bits are
    /// dropped on serialization
    pub deviation: u16,
    /// Symbol rate prescaler
    pub pre_scale: u8,
    /// Symbol rate word
    pub rate_word: u32,
    /// Receiver bandwidth code
    pub rx_bw: u8,
    /// Preamble length in bytes
    pub preamble_bytes: u8,
    /// Sync word length in bits
    pub sync_word_bits: u8,
    /// Raw TX power setting
    pub tx_power: u16,
    /// Center frequency in MHz
    pub center_freq: u16,
    /// Intermediate frequency, 0x8000 selects the default
    pub int_freq: i16,
    /// LO divider for the band
    pub lo_divider: u8,
}

impl Default for SetupParams {
    /// 50 kbps 2-GFSK, 25 kHz deviation, 868 MHz
    fn default() -> Self {
        Self {
            modulation: ModulationType::Fsk,
            deviation: 100,
            pre_scale: 0x0F,
            rate_word: 0x8000,
            rx_bw: 0x52,
            preamble_bytes: 4,
            sync_word_bits: 32,
            tx_power: 0xA73F,
            center_freq: 868,
            int_freq: i16::MIN,
            lo_divider: 5,
        }
    }
}

impl ToByteArray for SetupParams {
    type Error = Infallible;
    type Array = [u8; 16];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let modulation =
            (self.modulation as u16 & 0x07) | ((self.deviation & DEVIATION_MAX) << 3);
        let symbol_rate = u32::from(self.pre_scale & 0x0F) | ((self.rate_word & 0x1F_FFFF) << 4);

        let mut bytes = [0u8; 16];
        bytes[0..2].copy_from_slice(&modulation.to_le_bytes());
        bytes[2..6].copy_from_slice(&symbol_rate.to_le_bytes());
        bytes[6] = self.rx_bw;
        bytes[7] = self.preamble_bytes & 0x3F;
        bytes[8] = self.sync_word_bits & 0x3F;
        bytes[9..11].copy_from_slice(&self.tx_power.to_le_bytes());
        bytes[11..13].copy_from_slice(&self.center_freq.to_le_bytes());
        bytes[13..15].copy_from_slice(&self.int_freq.to_le_bytes());
        bytes[15] = self.lo_divider;
        Ok(bytes)
    }
}

impl FromByteArray for SetupParams {
    type Error = DecodeError;
    type Array = [u8; 16];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        let modulation = u16::from_le_bytes([bytes[0], bytes[1]]);
        let symbol_rate = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);

        Ok(Self {
            modulation: ModulationType::try_from((modulation & 0x07) as u8)?,
            deviation: modulation >> 3,
            pre_scale: (symbol_rate & 0x0F) as u8,
            rate_word: symbol_rate >> 4,
            rx_bw: bytes[6],
            preamble_bytes: bytes[7],
            sync_word_bits: bytes[8],
            tx_power: u16::from_le_bytes([bytes[9], bytes[10]]),
            center_freq: u16::from_le_bytes([bytes[11], bytes[12]]),
            int_freq: i16::from_le_bytes([bytes[13], bytes[14]]),
            lo_divider: bytes[15],
        })
    }
}

/// CMD_PROP_RADIO_DIV_SETUP (0x3807)
///
/// Sets up the radio for proprietary mode on the sub-GHz front end.
#[derive(Debug, Clone, Default)]
pub struct PropRadioDivSetup {
    /// Command parameters
    pub params: SetupParams,
}

impl Command for PropRadioDivSetup {
    type IdType = u16;
    type CommandParameters = SetupParams;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x3807
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.params
    }
}

/// CMD_FS parameters
///
/// # Byte Format (little endian)
/// `startTrigger, startTime[4], condition, frequency[2], fractFreq[2], synthConf`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsParams {
    /// Start trigger
    pub start_trigger: Trigger,
    /// Start time in ticks, for timed triggers
    pub start_time: u32,
    /// Chaining condition
    pub condition: Condition,
    /// Integer frequency in MHz
    pub frequency: u16,
    /// Fractional frequency in 1/65536 MHz
    pub fract_freq: u16,
    /// Tune for transmit (bit 0) rather than receive
    pub tx_mode: bool,
}

impl Default for FsParams {
    fn default() -> Self {
        Self {
            start_trigger: Trigger::new(TriggerType::Now),
            start_time: 0,
            condition: Condition::new(ConditionRule::Never),
            frequency: 868,
            fract_freq: 0,
            tx_mode: false,
        }
    }
}

impl ToByteArray for FsParams {
    type Error = Infallible;
    type Array = [u8; 11];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 11];
        bytes[0] = self.start_trigger.to_byte();
        bytes[1..5].copy_from_slice(&self.start_time.to_le_bytes());
        bytes[5] = self.condition.to_byte();
        bytes[6..8].copy_from_slice(&self.frequency.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.fract_freq.to_le_bytes());
        bytes[10] = self.tx_mode as u8;
        Ok(bytes)
    }
}

impl FromByteArray for FsParams {
    type Error = DecodeError;
    type Array = [u8; 11];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            start_trigger: Trigger::from_byte(bytes[0])?,
            start_time: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            condition: Condition::from_byte(bytes[5])?,
            frequency: u16::from_le_bytes([bytes[6], bytes[7]]),
            fract_freq: u16::from_le_bytes([bytes[8], bytes[9]]),
            tx_mode: bytes[10] & 0x01 != 0,
        })
    }
}

/// CMD_FS (0x0803)
///
/// Programs and locks the frequency synthesizer.
///
/// # Important Notes
/// - Must run after the radio setup and before any packet command
/// - Posted without waiting; packet commands queue behind it
#[derive(Debug, Clone, Default)]
pub struct Fs {
    /// Command parameters
    pub params: FsParams,
}

impl Command for Fs {
    type IdType = u16;
    type CommandParameters = FsParams;
    type ResponseParameters = NoParameters;

    fn id() -> Self::IdType {
        0x0803
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.params
    }
}
