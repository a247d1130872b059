#![cfg_attr(not(test), no_std)]
//! Proprietary Mode Radio Driver
//!
//! This crate drives the RF core of TI CC13xx sub-GHz radios in proprietary
//! mode. It sits on top of an RF core driver, which owns the hardware, and
//! exposes four blocking operations to application code:
//!
//! - [`Device::init`]: open the radio session and configure the commands
//! - [`Device::receive`]: receive one packet, optionally with a timeout
//! - [`Device::transmit`]: transmit one packet
//! - [`Device::is_channel_busy`]: carrier sense
//!
//! # Architecture
//! - [`queue`]: the two-slot receive ring the RF core lands packets into
//!   - Slots are pre-allocated and linked into a cycle by index
//!   - The driver hands out committed slots without copying
//!
//! - [`device`]: the command driver
//!   - Owns the RF core, the ring and the reusable packet commands
//!   - Translates timeouts into radio timer ticks (4000 per ms)
//!   - Inspects terminal status words
//!
//! - [`commands`]: RF core command descriptors built on `regiface`
//! - [`rf`]: the [`RfCore`] trait the hardware side implements
//! - [`config`]: static configuration with the reference calibration
//!
//! # Important Notes
//! - Every operation blocks until the RF core reports a terminal status
//! - A received [`Bytes`] view is valid until the next receive; copy it with
//!   [`Bytes::to_packet`] to keep it
//! - Receive failures of every kind collapse to the null buffer;
//!   [`Device::receive_outcome`] keeps timeout and error apart
//! - Anything but "busy" from carrier sense reads as idle
//!
//! # Example
//! ```no_run
//! use prop_radio::{Bytes, Config, Device, RfCore};
//!
//! fn ping<RF: RfCore>(rf: RF) -> Result<bool, prop_radio::Error<RF::Error>> {
//!     let mut device = Device::init(rf, Config::default())?;
//!
//!     while device.is_channel_busy() {}
//!     device.transmit(Bytes::new(b"ping"))?;
//!
//!     let reply = device.receive(500);
//!     Ok(reply.as_slice() == b"pong")
//! }
//! ```

mod fmt;

pub mod bytes;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod queue;
pub mod rf;

pub use bytes::{Bytes, Packet};
pub use commands::CommandStatus;
pub use config::Config;
pub use device::{ChannelState, Device, RxOutcome};
pub use error::Error;
pub use queue::{RxQueue, MAX_PACKET_LENGTH};
pub use rf::{CommandIo, Priority, RfCore, RfParams};
