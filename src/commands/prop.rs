//! Proprietary mode packet commands
//!
//! - [`PropRx`]: receive one packet into the receive ring
//! - [`PropTx`]: transmit one packet from a caller buffer
//! - [`PropCs`]: carrier sense, report whether the channel is busy
//!
//! The receive queue and transmit buffer are not part of the parameter
//! blocks; they travel next to the command as [`CommandIo`](crate::rf::CommandIo).

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{Command, FromByteArray, ToByteArray};

use super::common::{Condition, ConditionRule, Trigger, TriggerType};
use super::status::CommandStatus;
use super::DecodeError;
use crate::config::RSSI_THRESHOLD;
use crate::queue::MAX_PACKET_LENGTH;

/// Sync word used by the default proprietary settings
pub const DEFAULT_SYNC_WORD: u32 = 0x930B_51DE;

bitflags! {
    /// Receive packet configuration
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RxPktConf: u8 {
        /// Turn the synthesizer off when the command ends
        const FS_OFF = 1;
        /// Keep receiving after a packet with CRC OK
        const REPEAT_OK = 1 << 2;
        /// Keep receiving after a packet with CRC error
        const REPEAT_NOK = 1 << 3;
        /// Check CRC
        const USE_CRC = 1 << 4;
        /// Length byte is the first byte after the sync word
        const VAR_LEN = 1 << 5;
        /// Check the address byte
        const CHK_ADDRESS = 1 << 6;
        /// Stop on the end trigger even when a packet is being received
        const END_TYPE = 1 << 7;
    }
}

bitflags! {
    /// Receive data handling
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RxConf: u8 {
        /// Drop ignored packets from the receive queue
        const AUTO_FLUSH_IGNORED = 1;
        /// Drop packets with CRC error from the receive queue
        const AUTO_FLUSH_CRC_ERR = 1 << 1;
        /// Store the header byte in the queue
        const INCLUDE_HDR = 1 << 3;
        /// Store the CRC in the queue
        const INCLUDE_CRC = 1 << 4;
        /// Append an RSSI byte
        const APPEND_RSSI = 1 << 5;
        /// Append a timestamp
        const APPEND_TIMESTAMP = 1 << 6;
        /// Append a status byte
        const APPEND_STATUS = 1 << 7;
    }
}

bitflags! {
    /// Transmit packet configuration
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TxPktConf: u8 {
        /// Turn the synthesizer off when the command ends
        const FS_OFF = 1;
        /// Append a CRC
        const USE_CRC = 1 << 3;
        /// Send the length byte after the sync word
        const VAR_LEN = 1 << 4;
    }
}

bitflags! {
    /// Carrier sense synthesizer handling
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CsFsConf: u8 {
        /// Turn the synthesizer off if the channel is idle
        const FS_OFF_IDLE = 1;
        /// Turn the synthesizer off if the channel is busy
        const FS_OFF_BUSY = 1 << 1;
    }
}

bitflags! {
    /// Carrier sense configuration
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CsConf: u8 {
        /// Use RSSI as a busy criterion
        const ENA_RSSI = 1;
        /// Use correlation as a busy criterion
        const ENA_CORR = 1 << 1;
        /// Busy only if both criteria agree (OR when clear)
        const OPERATION_AND = 1 << 2;
        /// End carrier sense as soon as the channel is busy
        const BUSY_OP = 1 << 3;
        /// End carrier sense as soon as the channel is idle
        const IDLE_OP = 1 << 4;
        /// Report busy instead of idle when the window times out undecided
        const TIMEOUT_RES = 1 << 5;
    }
}

/// CMD_PROP_RX parameters
///
/// # Byte Format (little endian)
/// `startTrigger, startTime[4], condition, pktConf, rxConf, syncWord[4],
/// maxPktLen, endTrigger, endTime[4]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxParams {
    /// Start trigger
    pub start_trigger: Trigger,
    /// Start time in ticks, for timed triggers
    pub start_time: u32,
    /// Chaining condition
    pub condition: Condition,
    /// Packet configuration
    pub pkt_conf: RxPktConf,
    /// Queue handling
    pub rx_conf: RxConf,
    /// Sync word to listen for
    pub sync_word: u32,
    /// Largest accepted packet, longer packets are ignored
    pub max_pkt_len: u8,
    /// End trigger
    pub end_trigger: Trigger,
    /// End time in ticks relative to the end trigger reference
    pub end_time: u32,
}

impl Default for RxParams {
    fn default() -> Self {
        Self {
            start_trigger: Trigger::new(TriggerType::Now),
            start_time: 0,
            condition: Condition::new(ConditionRule::Never),
            pkt_conf: RxPktConf::USE_CRC | RxPktConf::VAR_LEN,
            rx_conf: RxConf::AUTO_FLUSH_IGNORED | RxConf::AUTO_FLUSH_CRC_ERR,
            sync_word: DEFAULT_SYNC_WORD,
            max_pkt_len: MAX_PACKET_LENGTH as u8,
            end_trigger: Trigger::new(TriggerType::Never),
            end_time: 0,
        }
    }
}

impl ToByteArray for RxParams {
    type Error = Infallible;
    type Array = [u8; 18];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 18];
        bytes[0] = self.start_trigger.to_byte();
        bytes[1..5].copy_from_slice(&self.start_time.to_le_bytes());
        bytes[5] = self.condition.to_byte();
        bytes[6] = self.pkt_conf.bits();
        bytes[7] = self.rx_conf.bits();
        bytes[8..12].copy_from_slice(&self.sync_word.to_le_bytes());
        bytes[12] = self.max_pkt_len;
        bytes[13] = self.end_trigger.to_byte();
        bytes[14..18].copy_from_slice(&self.end_time.to_le_bytes());
        Ok(bytes)
    }
}

impl FromByteArray for RxParams {
    type Error = DecodeError;
    type Array = [u8; 18];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            start_trigger: Trigger::from_byte(bytes[0])?,
            start_time: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            condition: Condition::from_byte(bytes[5])?,
            pkt_conf: RxPktConf::from_bits_retain(bytes[6]),
            rx_conf: RxConf::from_bits_retain(bytes[7]),
            sync_word: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            max_pkt_len: bytes[12],
            end_trigger: Trigger::from_byte(bytes[13])?,
            end_time: u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]),
        })
    }
}

/// CMD_PROP_RX (0x3802)
///
/// Receives a single packet into the queue passed alongside the command.
///
/// # Important Notes
/// - Ends with `PROP_DONE_OK` once a packet with valid CRC is committed
/// - Ends with `PROP_DONE_RXTIMEOUT` when the end trigger fires first
/// - Packets with CRC error end the command with `PROP_DONE_RXERR` and are
///   only kept in the queue if `AUTO_FLUSH_CRC_ERR` is clear
#[derive(Debug, Clone, Default)]
pub struct PropRx {
    /// Command parameters
    pub params: RxParams,
}

impl Command for PropRx {
    type IdType = u16;
    type CommandParameters = RxParams;
    type ResponseParameters = CommandStatus;

    fn id() -> Self::IdType {
        0x3802
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.params
    }
}

/// CMD_PROP_TX parameters
///
/// # Byte Format (little endian)
/// `startTrigger, startTime[4], condition, pktConf, pktLen, syncWord[4]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    /// Start trigger
    pub start_trigger: Trigger,
    /// Start time in ticks, for timed triggers
    pub start_time: u32,
    /// Chaining condition
    pub condition: Condition,
    /// Packet configuration
    pub pkt_conf: TxPktConf,
    /// Payload length in bytes
    pub pkt_len: u8,
    /// Sync word to send
    pub sync_word: u32,
}

impl Default for TxParams {
    fn default() -> Self {
        Self {
            start_trigger: Trigger::new(TriggerType::Now),
            start_time: 0,
            condition: Condition::new(ConditionRule::Never),
            pkt_conf: TxPktConf::USE_CRC | TxPktConf::VAR_LEN,
            pkt_len: 0,
            sync_word: DEFAULT_SYNC_WORD,
        }
    }
}

impl ToByteArray for TxParams {
    type Error = Infallible;
    type Array = [u8; 12];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 12];
        bytes[0] = self.start_trigger.to_byte();
        bytes[1..5].copy_from_slice(&self.start_time.to_le_bytes());
        bytes[5] = self.condition.to_byte();
        bytes[6] = self.pkt_conf.bits();
        bytes[7] = self.pkt_len;
        bytes[8..12].copy_from_slice(&self.sync_word.to_le_bytes());
        Ok(bytes)
    }
}

impl FromByteArray for TxParams {
    type Error = DecodeError;
    type Array = [u8; 12];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            start_trigger: Trigger::from_byte(bytes[0])?,
            start_time: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            condition: Condition::from_byte(bytes[5])?,
            pkt_conf: TxPktConf::from_bits_retain(bytes[6]),
            pkt_len: bytes[7],
            sync_word: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// CMD_PROP_TX (0x3801)
///
/// Transmits the buffer passed alongside the command.
///
/// # Important Notes
/// - The buffer must stay valid and unmodified until the command ends
/// - Ends with `PROP_DONE_OK` once the packet is on air
#[derive(Debug, Clone, Default)]
pub struct PropTx {
    /// Command parameters
    pub params: TxParams,
}

impl Command for PropTx {
    type IdType = u16;
    type CommandParameters = TxParams;
    type ResponseParameters = CommandStatus;

    fn id() -> Self::IdType {
        0x3801
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.params
    }
}

/// CMD_PROP_CS parameters
///
/// # Byte Format (little endian)
/// `startTrigger, startTime[4], condition, csFsConf, csConf, rssiThr,
/// numRssiIdle, numRssiBusy, corrPeriod[2], corrConfig, csEndTrigger,
/// csEndTime[4]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsParams {
    /// Start trigger
    pub start_trigger: Trigger,
    /// Start time in ticks, for timed triggers
    pub start_time: u32,
    /// Chaining condition
    pub condition: Condition,
    /// Synthesizer handling
    pub cs_fs_conf: CsFsConf,
    /// Busy/idle criteria
    pub cs_conf: CsConf,
    /// RSSI threshold in dBm
    pub rssi_thr: i8,
    /// Consecutive RSSI readings below threshold to declare idle
    pub num_rssi_idle: u8,
    /// Consecutive RSSI readings above threshold to declare busy
    pub num_rssi_busy: u8,
    /// Correlation period in ticks
    pub corr_period: u16,
    /// Correlation tops before invalidation (bits 3:0) and to declare busy (bits 7:4)
    pub corr_config: u8,
    /// End trigger of the sensing window
    pub cs_end_trigger: Trigger,
    /// Sensing window in ticks
    pub cs_end_time: u32,
}

impl Default for CsParams {
    fn default() -> Self {
        Self {
            start_trigger: Trigger::new(TriggerType::Now),
            start_time: 0,
            condition: Condition::new(ConditionRule::Never),
            cs_fs_conf: CsFsConf::empty(),
            cs_conf: CsConf::ENA_RSSI,
            rssi_thr: RSSI_THRESHOLD,
            num_rssi_idle: 1,
            num_rssi_busy: 1,
            corr_period: 0,
            corr_config: 0,
            cs_end_trigger: Trigger::new(TriggerType::RelStart),
            cs_end_time: 0,
        }
    }
}

impl ToByteArray for CsParams {
    type Error = Infallible;
    type Array = [u8; 19];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut bytes = [0u8; 19];
        bytes[0] = self.start_trigger.to_byte();
        bytes[1..5].copy_from_slice(&self.start_time.to_le_bytes());
        bytes[5] = self.condition.to_byte();
        bytes[6] = self.cs_fs_conf.bits();
        bytes[7] = self.cs_conf.bits();
        bytes[8] = self.rssi_thr as u8;
        bytes[9] = self.num_rssi_idle;
        bytes[10] = self.num_rssi_busy;
        bytes[11..13].copy_from_slice(&self.corr_period.to_le_bytes());
        bytes[13] = self.corr_config;
        bytes[14] = self.cs_end_trigger.to_byte();
        bytes[15..19].copy_from_slice(&self.cs_end_time.to_le_bytes());
        Ok(bytes)
    }
}

impl FromByteArray for CsParams {
    type Error = DecodeError;
    type Array = [u8; 19];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            start_trigger: Trigger::from_byte(bytes[0])?,
            start_time: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            condition: Condition::from_byte(bytes[5])?,
            cs_fs_conf: CsFsConf::from_bits_retain(bytes[6]),
            cs_conf: CsConf::from_bits_retain(bytes[7]),
            rssi_thr: bytes[8] as i8,
            num_rssi_idle: bytes[9],
            num_rssi_busy: bytes[10],
            corr_period: u16::from_le_bytes([bytes[11], bytes[12]]),
            corr_config: bytes[13],
            cs_end_trigger: Trigger::from_byte(bytes[14])?,
            cs_end_time: u32::from_le_bytes([bytes[15], bytes[16], bytes[17], bytes[18]]),
        })
    }
}

/// CMD_PROP_CS (0x3805)
///
/// Listens on the channel and reports whether it is occupied.
///
/// # Important Notes
/// - `PROP_DONE_BUSY`: channel busy, window cut short if `BUSY_OP` is set
/// - `PROP_DONE_IDLE`: channel idle for the whole window
/// - The synthesizer must already be running
#[derive(Debug, Clone, Default)]
pub struct PropCs {
    /// Command parameters
    pub params: CsParams,
}

impl Command for PropCs {
    type IdType = u16;
    type CommandParameters = CsParams;
    type ResponseParameters = CommandStatus;

    fn id() -> Self::IdType {
        0x3805
    }

    fn invoking_parameters(self) -> Self::CommandParameters {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rx_params_layout() {
        let params = RxParams {
            end_trigger: Trigger::new(TriggerType::RelStart),
            end_time: 4_000_000,
            ..Default::default()
        };
        let bytes = params.to_bytes().unwrap();
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[5], 0x01);
        assert_eq!(bytes[6], 0x30);
        assert_eq!(bytes[7], 0x03);
        assert_eq!(&bytes[8..12], &[0xDE, 0x51, 0x0B, 0x93]);
        assert_eq!(bytes[12], 252);
        assert_eq!(bytes[13], 0x04);
        assert_eq!(&bytes[14..18], &4_000_000u32.to_le_bytes());
        assert_eq!(RxParams::from_bytes(bytes).unwrap(), params);
    }

    #[test]
    fn cs_params_keep_negative_threshold() {
        let params = CsParams {
            cs_conf: CsConf::ENA_RSSI | CsConf::BUSY_OP,
            cs_end_time: 200_600,
            ..Default::default()
        };
        let bytes = params.to_bytes().unwrap();
        assert_eq!(bytes[7], 0x09);
        assert_eq!(bytes[8], 0xA6);
        let decoded = CsParams::from_bytes(bytes).unwrap();
        assert_eq!(decoded.rssi_thr, -90);
        assert_eq!(decoded, params);
    }

    #[test]
    fn cs_default_threshold_matches_config() {
        assert_eq!(CsParams::default().rssi_thr, RSSI_THRESHOLD);
    }

    #[test]
    fn tx_params_carry_length() {
        let params = TxParams {
            pkt_len: 3,
            ..Default::default()
        };
        let bytes = params.to_bytes().unwrap();
        assert_eq!(bytes[7], 3);
        assert_eq!(TxParams::from_bytes(bytes).unwrap(), params);
    }

    #[test]
    fn command_ids() {
        assert_eq!(PropTx::id(), 0x3801);
        assert_eq!(PropRx::id(), 0x3802);
        assert_eq!(PropCs::id(), 0x3805);
    }
}
