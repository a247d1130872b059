use core::fmt;

use crate::commands::CommandStatus;

/// Driver error, generic over the RF core driver error `E`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The radio session could not be opened
    Open(E),
    /// The RF core driver failed to run a command
    Driver(E),
    /// A command finished with a status other than OK
    Command(CommandStatus),
    /// Payload longer than the 255 bytes a length field can carry
    PacketTooLong(usize),
    /// The RF core returned a status word that could not be decoded
    Decode,
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "failed to open radio session: {e:?}"),
            Self::Driver(e) => write!(f, "RF core driver error: {e:?}"),
            Self::Command(status) => {
                write!(f, "command ended with status {:#06x}", status.code())
            }
            Self::PacketTooLong(len) => write!(f, "packet of {len} bytes is too long"),
            Self::Decode => f.write_str("undecodable command status"),
        }
    }
}
