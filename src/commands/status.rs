//! Terminal command status
//!
//! The RF core writes a 16-bit status word into every command when it
//! finishes. Radio-independent codes live in the 0x0xxx range, proprietary
//! mode codes in 0x3xxx. `0x?4??` means the command finished normally,
//! `0x?8??` means it finished with an error.

use core::convert::Infallible;

use regiface::FromByteArray;

/// Command status as reported by the RF core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandStatus {
    /// Not run yet
    Idle,
    /// Submitted, waiting for the start trigger
    Pending,
    /// Running
    Active,
    /// Skipped by a chaining condition
    Skipped,
    /// Finished normally (radio-independent command)
    DoneOk,
    /// Radio-independent command stopped
    DoneStopped,
    /// Radio-independent command aborted
    DoneAbort,
    /// Start trigger occurred in the past
    ErrorPastStart,
    /// Illegal parameter
    ErrorPar,
    /// No radio setup has been run
    ErrorNoSetup,
    /// Synthesizer could not be programmed
    ErrorSynthProg,
    /// Operation ended normally
    PropDoneOk,
    /// Receive window ended on its end trigger
    PropDoneRxTimeout,
    /// Receive stopped by a break trigger
    PropDoneBreak,
    /// Operation ended after the end trigger while receiving a packet
    PropDoneEnded,
    /// Operation stopped after a stop command
    PropDoneStopped,
    /// Operation aborted by an abort command
    PropDoneAbort,
    /// Packet received with CRC error
    PropDoneRxErr,
    /// Carrier sense ended with channel idle
    PropDoneIdle,
    /// Carrier sense ended with channel busy
    PropDoneBusy,
    /// Carrier sense ended on timeout with channel idle
    PropDoneIdleTimeout,
    /// Carrier sense ended on timeout with channel busy
    PropDoneBusyTimeout,
    /// Illegal parameter
    PropErrorPar,
    /// No available receive buffer at the start of a packet
    PropErrorRxBuf,
    /// Out of receive buffer space during a packet
    PropErrorRxFull,
    /// No radio setup has been run
    PropErrorNoSetup,
    /// Synthesizer was not configured
    PropErrorNoFs,
    /// Receive overflow
    PropErrorRxOvf,
    /// Transmit underflow
    PropErrorTxUnf,
    /// Any code not listed above
    Other(u16),
}

impl CommandStatus {
    /// Raw status word.
    pub fn code(self) -> u16 {
        match self {
            Self::Idle => 0x0000,
            Self::Pending => 0x0001,
            Self::Active => 0x0002,
            Self::Skipped => 0x0003,
            Self::DoneOk => 0x0400,
            Self::DoneStopped => 0x0404,
            Self::DoneAbort => 0x0405,
            Self::ErrorPastStart => 0x0800,
            Self::ErrorPar => 0x0803,
            Self::ErrorNoSetup => 0x0807,
            Self::ErrorSynthProg => 0x0809,
            Self::PropDoneOk => 0x3400,
            Self::PropDoneRxTimeout => 0x3401,
            Self::PropDoneBreak => 0x3402,
            Self::PropDoneEnded => 0x3403,
            Self::PropDoneStopped => 0x3404,
            Self::PropDoneAbort => 0x3405,
            Self::PropDoneRxErr => 0x3406,
            Self::PropDoneIdle => 0x3407,
            Self::PropDoneBusy => 0x3408,
            Self::PropDoneIdleTimeout => 0x3409,
            Self::PropDoneBusyTimeout => 0x340A,
            Self::PropErrorPar => 0x3800,
            Self::PropErrorRxBuf => 0x3801,
            Self::PropErrorRxFull => 0x3802,
            Self::PropErrorNoSetup => 0x3803,
            Self::PropErrorNoFs => 0x3804,
            Self::PropErrorRxOvf => 0x3805,
            Self::PropErrorTxUnf => 0x3806,
            Self::Other(code) => code,
        }
    }

    /// Returns true for any "finished normally" code.
    pub fn is_done(self) -> bool {
        self.code() & 0x0C00 == 0x0400
    }

    /// Returns true for any error code.
    pub fn is_error(self) -> bool {
        self.code() & 0x0C00 == 0x0800
    }
}

impl From<u16> for CommandStatus {
    fn from(code: u16) -> Self {
        match code {
            0x0000 => Self::Idle,
            0x0001 => Self::Pending,
            0x0002 => Self::Active,
            0x0003 => Self::Skipped,
            0x0400 => Self::DoneOk,
            0x0404 => Self::DoneStopped,
            0x0405 => Self::DoneAbort,
            0x0800 => Self::ErrorPastStart,
            0x0803 => Self::ErrorPar,
            0x0807 => Self::ErrorNoSetup,
            0x0809 => Self::ErrorSynthProg,
            0x3400 => Self::PropDoneOk,
            0x3401 => Self::PropDoneRxTimeout,
            0x3402 => Self::PropDoneBreak,
            0x3403 => Self::PropDoneEnded,
            0x3404 => Self::PropDoneStopped,
            0x3405 => Self::PropDoneAbort,
            0x3406 => Self::PropDoneRxErr,
            0x3407 => Self::PropDoneIdle,
            0x3408 => Self::PropDoneBusy,
            0x3409 => Self::PropDoneIdleTimeout,
            0x340A => Self::PropDoneBusyTimeout,
            0x3800 => Self::PropErrorPar,
            0x3801 => Self::PropErrorRxBuf,
            0x3802 => Self::PropErrorRxFull,
            0x3803 => Self::PropErrorNoSetup,
            0x3804 => Self::PropErrorNoFs,
            0x3805 => Self::PropErrorRxOvf,
            0x3806 => Self::PropErrorTxUnf,
            other => Self::Other(other),
        }
    }
}

impl From<CommandStatus> for u16 {
    fn from(status: CommandStatus) -> Self {
        status.code()
    }
}

impl FromByteArray for CommandStatus {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self::from(u16::from_le_bytes(bytes)))
    }
}
