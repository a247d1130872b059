//! RF core command descriptors
//!
//! Every command the driver issues is a [`regiface::Command`] whose
//! parameters serialize to the little-endian layout the RF core expects.
//! Commands are grouped by purpose:
//!
//! - [`common`]: triggers, chaining conditions and radio timer ticks
//! - [`setup`]: radio setup and frequency synthesizer, run once per session
//! - [`prop`]: proprietary mode receive, transmit and carrier sense
//! - [`status`]: terminal status words
//!
//! Parameter blocks also implement [`regiface::FromByteArray`] so an RF core
//! implementation can decode what it was asked to run.

pub mod common;
pub mod prop;
pub mod setup;
pub mod status;

pub use common::*;
pub use prop::*;
pub use setup::*;
pub use status::*;

/// Error decoding a serialized parameter block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The trigger type nibble is not a known trigger
    InvalidTrigger(u8),
    /// The condition rule nibble is not a known rule
    InvalidCondition(u8),
    /// The modulation type is not a known modulation
    InvalidModulation(u8),
}
