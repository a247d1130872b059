//! RF core driver contract
//!
//! The driver does not talk to the RF core directly. It needs three primitives
//! from whatever owns the radio hardware:
//!
//! - open a session with a property table and a radio setup command
//! - post a command without waiting for it
//! - run a command and block until it reaches a terminal status
//!
//! Commands are passed as their id plus serialized parameter block. Buffers
//! the RF core reads or writes travel separately as [`CommandIo`].

use core::fmt::Debug;

use crate::queue::RxQueue;

/// Scheduling priority of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    /// Normal priority
    #[default]
    Normal = 0,
    /// High priority
    High = 1,
    /// Highest priority
    Highest = 2,
}

/// Session property table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RfParams {
    /// Idle time in microseconds before the RF core is powered down,
    /// `None` keeps it powered
    pub inactivity_timeout_us: Option<u32>,
    /// Power up duration in microseconds, `None` lets the driver measure it
    pub power_up_duration_us: Option<u32>,
}

/// Buffers attached to a running command
pub enum CommandIo<'a> {
    /// The command reads and writes no buffer
    None,
    /// Receive queue the RF core lands packets into
    Rx(&'a mut RxQueue),
    /// Packet the RF core transmits
    Tx(&'a [u8]),
}

/// Access to the RF core.
///
/// `run_cmd` must not return before the command has reached a terminal
/// status. The status word is written little endian into `status`.
pub trait RfCore {
    /// Error raised by the RF core driver itself, as opposed to a command
    /// finishing with a non-OK status.
    #[cfg(feature = "defmt")]
    type Error: Debug + defmt::Format;

    #[cfg(not(feature = "defmt"))]
    type Error: Debug;

    /// Opens the radio session.
    fn open(&mut self, params: &RfParams, setup_id: u16, setup: &[u8]) -> Result<(), Self::Error>;

    /// Submits a command and returns without waiting for it.
    fn post_cmd(&mut self, id: u16, params: &[u8], priority: Priority) -> Result<(), Self::Error>;

    /// Submits a command and blocks until it finishes.
    fn run_cmd(
        &mut self,
        id: u16,
        params: &[u8],
        priority: Priority,
        io: CommandIo<'_>,
        status: &mut [u8],
    ) -> Result<(), Self::Error>;
}

impl<T: RfCore + ?Sized> RfCore for &mut T {
    type Error = T::Error;

    fn open(&mut self, params: &RfParams, setup_id: u16, setup: &[u8]) -> Result<(), Self::Error> {
        T::open(self, params, setup_id, setup)
    }

    fn post_cmd(&mut self, id: u16, params: &[u8], priority: Priority) -> Result<(), Self::Error> {
        T::post_cmd(self, id, params, priority)
    }

    fn run_cmd(
        &mut self,
        id: u16,
        params: &[u8],
        priority: Priority,
        io: CommandIo<'_>,
        status: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::run_cmd(self, id, params, priority, io, status)
    }
}
