//! Scripted RF core
//!
//! [`MockRf`] stands in for the RF core driver. Each `run_cmd` consumes the
//! next scripted [`Reply`] and records what was asked of it, so tests can
//! check both the terminal status handling and the parameter blocks the
//! driver configured. Without a scripted reply, receive times out, carrier
//! sense reports idle and everything else finishes OK.

use heapless::{Deque, Vec};
use regiface::{Command, FromByteArray};

use crate::bytes::{Bytes, Packet};
use crate::commands::{
    CommandStatus, CsParams, PropCs, PropRx, PropTx, RxConf, RxParams, TxParams,
};
use crate::rf::{CommandIo, Priority, RfCore, RfParams};

/// Number of scripted replies and recorded commands kept.
pub const HISTORY: usize = 16;

/// Serialized parameter block
pub type Params = Vec<u8, 32>;

/// Scripted outcome of one command run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Finish with this status without touching any buffer
    Status(CommandStatus),
    /// Land a packet into the receive queue and finish OK,
    /// or finish with `PROP_ERROR_RXBUF` if no slot is free
    Packet(Packet),
    /// Receive a packet with CRC error. It stays in the queue unless the
    /// command asks for CRC-error packets to be flushed.
    CrcError(Packet),
}

impl Reply {
    /// Packet reply from a byte slice.
    pub fn packet(bytes: &[u8]) -> Self {
        Self::Packet(Bytes::new(bytes).to_packet())
    }

    /// CRC-error reply from a byte slice.
    pub fn crc_error(bytes: &[u8]) -> Self {
        Self::CrcError(Bytes::new(bytes).to_packet())
    }
}

/// A command the mock was asked to run or post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Command id
    pub id: u16,
    /// Serialized parameters
    pub params: Params,
    /// Requested priority
    pub priority: Priority,
    /// Transmitted payload, for commands run with a transmit buffer
    pub payload: Option<Packet>,
}

/// Session opened on the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Property table
    pub params: RfParams,
    /// Setup command id
    pub setup_id: u16,
    /// Serialized setup parameters
    pub setup: Params,
}

/// Mock failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MockError {
    /// Opening the session was set up to fail
    OpenFailed,
    /// Running commands was set up to fail
    Unavailable,
    /// Parameter block does not fit a [`Params`]
    ParamsTooLong,
}

/// Scripted [`RfCore`] implementation
pub struct MockRf {
    replies: Deque<Reply, HISTORY>,
    history: Deque<Record, HISTORY>,
    posted: Deque<Record, HISTORY>,
    session: Option<Session>,
    runs: usize,
    fail_open: bool,
    fail_run: bool,
}

impl Default for MockRf {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRf {
    /// A mock with an empty script.
    pub fn new() -> Self {
        Self {
            replies: Deque::new(),
            history: Deque::new(),
            posted: Deque::new(),
            session: None,
            runs: 0,
            fail_open: false,
            fail_run: false,
        }
    }

    /// A mock whose session cannot be opened.
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::new()
        }
    }

    /// Makes every following `run_cmd` fail at the driver level.
    pub fn set_fail_run(&mut self, fail: bool) {
        self.fail_run = fail;
    }

    /// Appends a reply to the script. Returns the reply back if the script is full.
    pub fn push_reply(&mut self, reply: Reply) -> Result<(), Reply> {
        self.replies.push_back(reply)
    }

    /// Replies not consumed yet.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// The opened session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Commands posted without waiting, oldest first.
    pub fn posted(&self) -> impl Iterator<Item = &Record> {
        self.posted.iter()
    }

    /// Most recent commands run, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Record> {
        self.history.iter()
    }

    /// Total number of commands run.
    pub fn run_count(&self) -> usize {
        self.runs
    }

    /// The most recent run of the command with this id.
    pub fn last_run(&self, id: u16) -> Option<&Record> {
        self.history.iter().rev().find(|record| record.id == id)
    }

    /// Parameters of the most recent receive command.
    pub fn last_rx_params(&self) -> Option<RxParams> {
        let record = self.last_run(PropRx::id())?;
        decode_rx(&record.params)
    }

    /// Parameters of the most recent transmit command.
    pub fn last_tx_params(&self) -> Option<TxParams> {
        let record = self.last_run(PropTx::id())?;
        let bytes = <[u8; 12]>::try_from(record.params.as_slice()).ok()?;
        TxParams::from_bytes(bytes).ok()
    }

    /// Parameters of the most recent carrier sense command.
    pub fn last_cs_params(&self) -> Option<CsParams> {
        let record = self.last_run(PropCs::id())?;
        let bytes = <[u8; 19]>::try_from(record.params.as_slice()).ok()?;
        CsParams::from_bytes(bytes).ok()
    }

    fn default_status(id: u16) -> CommandStatus {
        if id == PropRx::id() {
            CommandStatus::PropDoneRxTimeout
        } else if id == PropCs::id() {
            CommandStatus::PropDoneIdle
        } else {
            CommandStatus::PropDoneOk
        }
    }
}

fn decode_rx(params: &[u8]) -> Option<RxParams> {
    let bytes = <[u8; 18]>::try_from(params).ok()?;
    RxParams::from_bytes(bytes).ok()
}

fn remember(log: &mut Deque<Record, HISTORY>, record: Record) {
    if log.is_full() {
        log.pop_front();
    }
    // cannot fail, a slot was just freed
    let _ = log.push_back(record);
}

impl RfCore for MockRf {
    type Error = MockError;

    fn open(&mut self, params: &RfParams, setup_id: u16, setup: &[u8]) -> Result<(), Self::Error> {
        if self.fail_open {
            return Err(MockError::OpenFailed);
        }
        self.session = Some(Session {
            params: *params,
            setup_id,
            setup: Params::from_slice(setup).map_err(|_| MockError::ParamsTooLong)?,
        });
        Ok(())
    }

    fn post_cmd(&mut self, id: u16, params: &[u8], priority: Priority) -> Result<(), Self::Error> {
        let record = Record {
            id,
            params: Params::from_slice(params).map_err(|_| MockError::ParamsTooLong)?,
            priority,
            payload: None,
        };
        remember(&mut self.posted, record);
        Ok(())
    }

    fn run_cmd(
        &mut self,
        id: u16,
        params: &[u8],
        priority: Priority,
        io: CommandIo<'_>,
        status: &mut [u8],
    ) -> Result<(), Self::Error> {
        if self.fail_run {
            return Err(MockError::Unavailable);
        }

        let payload = match &io {
            CommandIo::Tx(packet) => Some(Bytes::new(packet).to_packet()),
            _ => None,
        };
        let record = Record {
            id,
            params: Params::from_slice(params).map_err(|_| MockError::ParamsTooLong)?,
            priority,
            payload,
        };
        remember(&mut self.history, record);
        self.runs += 1;

        let result = match (self.replies.pop_front(), io) {
            (Some(Reply::Status(status)), _) => status,
            (Some(Reply::Packet(packet)), CommandIo::Rx(queue)) => {
                if queue.land(&packet) {
                    CommandStatus::PropDoneOk
                } else {
                    CommandStatus::PropErrorRxBuf
                }
            }
            (Some(Reply::CrcError(packet)), CommandIo::Rx(queue)) => {
                let flush = decode_rx(params)
                    .map(|rx| rx.rx_conf.contains(RxConf::AUTO_FLUSH_CRC_ERR))
                    .unwrap_or(true);
                if !flush {
                    queue.land(&packet);
                }
                CommandStatus::PropDoneRxErr
            }
            (Some(_), _) => CommandStatus::PropErrorPar,
            (None, _) => Self::default_status(id),
        };

        let word = result.code().to_le_bytes();
        let len = status.len().min(word.len());
        status[..len].copy_from_slice(&word[..len]);
        Ok(())
    }
}
