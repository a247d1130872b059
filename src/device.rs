//! Radio command driver
//!
//! [`Device`] owns the RF core, the receive ring and the three packet
//! commands it reuses on every call. Each operation configures its command,
//! runs it to completion and inspects the terminal status:
//!
//! - [`Device::receive`] runs `CMD_PROP_RX` with an optional deadline and
//!   hands out the committed ring slot on success
//! - [`Device::transmit`] runs `CMD_PROP_TX` on a caller buffer
//! - [`Device::is_channel_busy`] runs `CMD_PROP_CS`
//!
//! Every operation blocks until the RF core is done and takes `&mut self`,
//! so at most one command is in flight. Share a device between threads by
//! putting the whole device behind one lock.
//!
//! # Example
//! ```no_run
//! use prop_radio::{Bytes, Config, Device, RfCore};
//!
//! fn echo<RF: RfCore>(rf: RF) -> Result<(), prop_radio::Error<RF::Error>> {
//!     let mut device = Device::init(rf, Config::default())?;
//!
//!     loop {
//!         let packet = device.receive(1000).to_packet();
//!         if !packet.is_empty() && !device.is_channel_busy() {
//!             device.transmit(Bytes::new(&packet))?;
//!         }
//!     }
//! }
//! ```

use core::convert::Infallible;

use regiface::{ByteArray, Command, FromByteArray, ToByteArray};

use crate::bytes::Bytes;
use crate::commands::{
    ms_to_ticks, CommandStatus, ConditionRule, CsConf, Fs, PropCs, PropRadioDivSetup, PropRx,
    PropTx, RxConf, TriggerType,
};
use crate::config::Config;
use crate::error::Error;
use crate::queue::RxQueue;
use crate::rf::{CommandIo, Priority, RfCore};

/// Result of a receive, with the failure causes kept apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxOutcome<'a> {
    /// A packet was committed to the ring
    Packet(Bytes<'a>),
    /// The deadline passed without a complete packet
    Timeout,
    /// Any other terminal status, `None` if the RF core driver itself failed
    Failed(Option<CommandStatus>),
}

impl<'a> RxOutcome<'a> {
    /// The received packet, or the null buffer for every other outcome.
    pub fn into_bytes(self) -> Bytes<'a> {
        match self {
            Self::Packet(bytes) => bytes,
            _ => Bytes::empty(),
        }
    }
}

/// Result of a carrier sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Someone is transmitting
    Busy,
    /// The channel stayed quiet for the whole window
    Idle,
    /// Any other terminal status, `None` if the RF core driver itself failed
    Unknown(Option<CommandStatus>),
}

/// Proprietary mode radio driver.
pub struct Device<RF> {
    rf: RF,
    priority: Priority,
    queue: RxQueue,
    rx: PropRx,
    tx: PropTx,
    cs: PropCs,
}

impl<RF> Device<RF> {
    /// Receive command as configured for the last call.
    pub fn rx_command(&self) -> &PropRx {
        &self.rx
    }

    /// Transmit command as configured for the last call.
    pub fn tx_command(&self) -> &PropTx {
        &self.tx
    }

    /// Carrier sense command.
    pub fn cs_command(&self) -> &PropCs {
        &self.cs
    }

    /// The receive ring.
    pub fn queue(&self) -> &RxQueue {
        &self.queue
    }

    /// The RF core.
    pub fn rf(&self) -> &RF {
        &self.rf
    }

    /// The RF core, mutably.
    pub fn rf_mut(&mut self) -> &mut RF {
        &mut self.rf
    }

    /// Releases the RF core.
    pub fn release(self) -> RF {
        self.rf
    }
}

impl<RF> Device<RF>
where
    RF: RfCore,
{
    /// Opens the radio session and configures the packet commands.
    ///
    /// The synthesizer command is posted without waiting and a failure to
    /// post it is not reported; packet commands will then fail on their own.
    ///
    /// # Errors
    /// * `Error::Open` - the RF core driver refused the session. Nothing else
    ///   in this driver is usable; callers usually treat this as fatal.
    pub fn init(mut rf: RF, config: Config) -> Result<Self, Error<RF::Error>> {
        let setup = encode(PropRadioDivSetup {
            params: config.setup,
        });
        rf.open(&config.rf_params, PropRadioDivSetup::id(), setup.as_slice())
            .map_err(Error::Open)?;

        let synth = encode(Fs {
            params: config.synth,
        });
        if rf.post_cmd(Fs::id(), synth.as_slice(), config.priority).is_err() {
            warn!("failed to post synthesizer command");
        }

        let mut rx = PropRx::default();
        rx.params.rx_conf.set(RxConf::AUTO_FLUSH_IGNORED, config.auto_flush_ignored);
        rx.params.rx_conf.set(RxConf::AUTO_FLUSH_CRC_ERR, config.auto_flush_crc_err);
        rx.params.max_pkt_len = config.max_packet_length();
        rx.params.start_trigger.trigger_type = TriggerType::Now;
        rx.params.end_trigger.trigger_type = TriggerType::Never;

        let mut tx = PropTx::default();
        tx.params.start_trigger.trigger_type = TriggerType::Now;

        let mut cs = PropCs::default();
        cs.params.cs_conf.insert(CsConf::ENA_RSSI | CsConf::BUSY_OP);
        cs.params.condition.rule = ConditionRule::Never;
        cs.params.cs_end_trigger.trigger_type = TriggerType::RelStart;
        cs.params.rssi_thr = config.rssi_threshold;
        cs.params.cs_end_time = config.cs_end_time;

        info!("radio session open");

        Ok(Self {
            rf,
            priority: config.priority,
            queue: RxQueue::new(),
            rx,
            tx,
            cs,
        })
    }

    /// Listens for the channel being in use.
    ///
    /// Returns true only for `PROP_DONE_BUSY`. Every other outcome, errors
    /// included, reads as not busy; use [`Device::carrier_sense`] to tell
    /// them apart.
    pub fn is_channel_busy(&mut self) -> bool {
        self.carrier_sense() == ChannelState::Busy
    }

    /// Runs carrier sense and classifies the terminal status.
    pub fn carrier_sense(&mut self) -> ChannelState {
        match execute(&mut self.rf, self.priority, self.cs.clone(), CommandIo::None) {
            Ok(CommandStatus::PropDoneBusy) => ChannelState::Busy,
            Ok(CommandStatus::PropDoneIdle) => ChannelState::Idle,
            Ok(status) => {
                trace!("carrier sense ended with {}", status);
                ChannelState::Unknown(Some(status))
            }
            Err(_) => ChannelState::Unknown(None),
        }
    }

    /// Receives a single packet.
    ///
    /// `timeout_ms == 0` waits forever. Returns the null buffer on timeout
    /// and on any failure. The returned view aliases a ring slot and must be
    /// consumed (or copied with [`Bytes::to_packet`]) before the next receive.
    pub fn receive(&mut self, timeout_ms: u32) -> Bytes<'_> {
        self.receive_outcome(timeout_ms).into_bytes()
    }

    /// Receives a single packet, reporting why nothing was received.
    pub fn receive_outcome(&mut self, timeout_ms: u32) -> RxOutcome<'_> {
        let params = &mut self.rx.params;
        if timeout_ms == 0 {
            params.end_trigger.trigger_type = TriggerType::Never;
            params.end_time = 0;
        } else {
            params.end_trigger.trigger_type = TriggerType::RelStart;
            params.end_time = ms_to_ticks(timeout_ms);
        }
        trace!("rx: timeout {} ms", timeout_ms);

        let status = execute(
            &mut self.rf,
            self.priority,
            self.rx.clone(),
            CommandIo::Rx(&mut self.queue),
        );

        match status {
            Ok(CommandStatus::PropDoneOk) if self.queue.has_committed() => {
                RxOutcome::Packet(self.queue.take_next())
            }
            Ok(CommandStatus::PropDoneOk) => {
                warn!("rx: done without a committed entry");
                RxOutcome::Failed(Some(CommandStatus::PropDoneOk))
            }
            Ok(CommandStatus::PropDoneRxTimeout) => {
                self.recycle_stale();
                RxOutcome::Timeout
            }
            Ok(status) => {
                self.recycle_stale();
                RxOutcome::Failed(Some(status))
            }
            Err(_) => {
                self.recycle_stale();
                RxOutcome::Failed(None)
            }
        }
    }

    /// Transmits a single packet from caller memory.
    ///
    /// # Errors
    /// * `Error::PacketTooLong` - more than 255 bytes, nothing was sent
    /// * `Error::Command` - the command ended with a status other than OK
    /// * `Error::Driver` - the RF core driver failed to run the command
    pub fn transmit(&mut self, bytes: Bytes<'_>) -> Result<(), Error<RF::Error>> {
        let payload = bytes.as_slice();
        self.tx.params.pkt_len =
            u8::try_from(payload.len()).map_err(|_| Error::PacketTooLong(payload.len()))?;
        trace!("tx: {} bytes", payload.len());

        match execute(
            &mut self.rf,
            self.priority,
            self.tx.clone(),
            CommandIo::Tx(payload),
        )? {
            CommandStatus::PropDoneOk => Ok(()),
            status => Err(Error::Command(status)),
        }
    }

    /// Recycles slots holding packets that ended in error, such as CRC
    /// failures kept because auto flush is off, so the cursor keeps
    /// following the slot the RF core fills next.
    fn recycle_stale(&mut self) {
        while self.queue.has_committed() {
            warn!("rx: dropping entry {}", self.queue.current());
            self.queue.discard_next();
        }
    }
}

/// Serializes a command's parameter block.
fn encode<C>(command: C) -> <C::CommandParameters as ToByteArray>::Array
where
    C: Command<IdType = u16>,
    C::CommandParameters: ToByteArray<Error = Infallible>,
{
    match command.invoking_parameters().to_bytes() {
        Ok(bytes) => bytes,
        Err(never) => match never {},
    }
}

/// Runs a command to completion and decodes its terminal status.
fn execute<RF, C>(
    rf: &mut RF,
    priority: Priority,
    command: C,
    io: CommandIo<'_>,
) -> Result<C::ResponseParameters, Error<RF::Error>>
where
    RF: RfCore,
    C: Command<IdType = u16>,
    C::CommandParameters: ToByteArray<Error = Infallible>,
{
    let request = encode(command);
    let mut raw_response = <C::ResponseParameters as FromByteArray>::Array::new();

    rf.run_cmd(C::id(), request.as_ref(), priority, io, raw_response.as_mut())
        .map_err(Error::Driver)?;

    C::ResponseParameters::from_bytes(raw_response).map_err(|_| Error::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandStatus, FsParams, SetupParams, Trigger};
    use crate::config::CS_END_TIME;
    use crate::mock::{MockError, MockRf, Reply};
    use crate::queue::{EntryStatus, MAX_PACKET_LENGTH};

    fn device() -> Device<MockRf> {
        Device::init(MockRf::new(), Config::default()).unwrap()
    }

    #[test]
    fn init_opens_session_and_posts_synth() {
        let device = device();
        let session = device.rf().session().unwrap();
        assert_eq!(session.setup_id, 0x3807);
        assert_eq!(session.setup.len(), 16);

        let posted: std::vec::Vec<_> = device.rf().posted().collect();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].id, 0x0803);
        assert_eq!(device.rf().run_count(), 0);
    }

    #[test]
    fn init_hands_encoded_blocks_to_rf_core() {
        let config = Config::default().with_frequency(915, 0x4000);
        let device = Device::init(MockRf::new(), config.clone()).unwrap();

        let setup = SetupParams::from_bytes(
            <[u8; 16]>::try_from(device.rf().session().unwrap().setup.as_slice()).unwrap(),
        )
        .unwrap();
        assert_eq!(setup, config.setup);

        let posted = device.rf().posted().next().unwrap();
        let synth = FsParams::from_bytes(<[u8; 11]>::try_from(posted.params.as_slice()).unwrap())
            .unwrap();
        assert_eq!(synth, config.synth);
        assert_eq!(posted.priority, config.priority);
    }

    #[test]
    fn init_failure_is_reported() {
        let result = Device::init(MockRf::failing_open(), Config::default());
        assert!(matches!(result, Err(Error::Open(MockError::OpenFailed))));
    }

    #[test]
    fn init_configures_commands() {
        let device = device();

        let rx = &device.rx_command().params;
        assert_eq!(rx.start_trigger, Trigger::new(TriggerType::Now));
        assert_eq!(rx.end_trigger.trigger_type, TriggerType::Never);
        assert_eq!(usize::from(rx.max_pkt_len), MAX_PACKET_LENGTH);
        assert!(rx.rx_conf.contains(RxConf::AUTO_FLUSH_IGNORED | RxConf::AUTO_FLUSH_CRC_ERR));

        let tx = &device.tx_command().params;
        assert_eq!(tx.start_trigger.trigger_type, TriggerType::Now);

        let cs = &device.cs_command().params;
        assert_eq!(cs.rssi_thr, -90);
        assert!(cs.cs_conf.contains(CsConf::ENA_RSSI | CsConf::BUSY_OP));
        assert!(!cs.cs_conf.contains(CsConf::IDLE_OP));
        assert_eq!(cs.condition.rule, ConditionRule::Never);
        assert_eq!(cs.cs_end_trigger.trigger_type, TriggerType::RelStart);
        assert_eq!(cs.cs_end_time, CS_END_TIME);
    }

    #[test]
    fn auto_flush_follows_config() {
        let config = Config {
            auto_flush_crc_err: false,
            ..Default::default()
        };
        let device = Device::init(MockRf::new(), config).unwrap();
        let rx_conf = device.rx_command().params.rx_conf;
        assert!(rx_conf.contains(RxConf::AUTO_FLUSH_IGNORED));
        assert!(!rx_conf.contains(RxConf::AUTO_FLUSH_CRC_ERR));
    }

    #[test]
    fn timeout_is_converted_to_ticks() {
        let mut device = device();
        device.receive(250);

        let params = device.rf().last_rx_params().unwrap();
        assert_eq!(params.end_trigger.trigger_type, TriggerType::RelStart);
        assert_eq!(params.end_time, 250 * 4000);
    }

    #[test]
    fn zero_timeout_never_ends() {
        let mut device = device();
        device.receive(0);

        let params = device.rf().last_rx_params().unwrap();
        assert_eq!(params.end_trigger.trigger_type, TriggerType::Never);
    }

    #[test]
    fn timeouts_do_not_leak_between_calls() {
        let mut device = device();

        device.receive(5);
        let first = device.rf().last_rx_params().unwrap();
        assert_eq!(first.end_trigger.trigger_type, TriggerType::RelStart);
        assert_eq!(first.end_time, 20_000);

        device.receive(0);
        let second = device.rf().last_rx_params().unwrap();
        assert_eq!(second.end_trigger.trigger_type, TriggerType::Never);
        assert_eq!(second.end_time, 0);

        device.receive(7);
        let third = device.rf().last_rx_params().unwrap();
        assert_eq!(third.end_trigger.trigger_type, TriggerType::RelStart);
        assert_eq!(third.end_time, 28_000);
    }

    #[test]
    fn non_success_returns_empty() {
        let statuses = [
            CommandStatus::PropDoneRxTimeout,
            CommandStatus::PropDoneRxErr,
            CommandStatus::PropDoneAbort,
            CommandStatus::PropErrorRxFull,
            CommandStatus::Other(0x1234),
        ];
        let mut device = device();
        for status in statuses {
            device.rf_mut().push_reply(Reply::Status(status)).unwrap();
            let bytes = device.receive(100);
            assert!(bytes.is_null());
            assert_eq!(bytes.len(), 0);
        }

        device.rf_mut().set_fail_run(true);
        let bytes = device.receive(100);
        assert!(bytes.is_null());
    }

    #[test]
    fn outcome_tags() {
        let mut device = device();
        assert_eq!(device.receive_outcome(10), RxOutcome::Timeout);

        device
            .rf_mut()
            .push_reply(Reply::Status(CommandStatus::PropDoneAbort))
            .unwrap();
        assert_eq!(
            device.receive_outcome(10),
            RxOutcome::Failed(Some(CommandStatus::PropDoneAbort))
        );

        device.rf_mut().set_fail_run(true);
        assert_eq!(device.receive_outcome(10), RxOutcome::Failed(None));
    }

    #[test]
    fn done_without_packet_is_not_handed_out() {
        let mut device = device();
        device
            .rf_mut()
            .push_reply(Reply::Status(CommandStatus::PropDoneOk))
            .unwrap();
        let bytes = device.receive(10);
        assert!(bytes.is_null());
        assert_eq!(device.queue().current(), 0);
    }

    #[test]
    fn receives_alternate_slots() {
        let mut device = device();
        for round in 0..5u8 {
            device.rf_mut().push_reply(Reply::packet(&[round; 3])).unwrap();
        }

        for round in 0..5u8 {
            assert_eq!(device.queue().current(), usize::from(round) % 2);
            let bytes = device.receive(1000);
            assert_eq!(bytes.as_slice(), &[round; 3]);
            let slot = usize::from(round) % 2;
            assert_eq!(device.queue().entry(slot).status(), EntryStatus::Pending);
        }
    }

    #[test]
    fn retained_crc_error_does_not_desync_ring() {
        let config = Config {
            auto_flush_crc_err: false,
            ..Default::default()
        };
        let mut device = Device::init(MockRf::new(), config).unwrap();
        device.rf_mut().push_reply(Reply::crc_error(&[0xEE, 0xEE])).unwrap();
        device.rf_mut().push_reply(Reply::packet(&[0x01, 0x02])).unwrap();

        assert_eq!(
            device.receive_outcome(100),
            RxOutcome::Failed(Some(CommandStatus::PropDoneRxErr))
        );
        assert_eq!(device.queue().current(), 1);

        let bytes = device.receive(100);
        assert_eq!(bytes.as_slice(), &[0x01, 0x02]);
    }

    #[test]
    fn busy_detection() {
        let mut device = device();

        device
            .rf_mut()
            .push_reply(Reply::Status(CommandStatus::PropDoneBusy))
            .unwrap();
        assert!(device.is_channel_busy());

        for status in [
            CommandStatus::PropDoneIdle,
            CommandStatus::PropDoneBusyTimeout,
            CommandStatus::PropErrorPar,
            CommandStatus::Other(0xFFFF),
        ] {
            device.rf_mut().push_reply(Reply::Status(status)).unwrap();
            assert!(!device.is_channel_busy());
        }

        device.rf_mut().set_fail_run(true);
        assert!(!device.is_channel_busy());
        assert_eq!(device.carrier_sense(), ChannelState::Unknown(None));
    }

    #[test]
    fn carrier_sense_runs_configured_window() {
        let mut device = device();
        assert_eq!(device.carrier_sense(), ChannelState::Idle);

        let params = device.rf().last_cs_params().unwrap();
        assert_eq!(params.cs_end_time, 200_600);
        assert_eq!(params.rssi_thr, -90);
    }

    #[test]
    fn transmit_sets_length_and_buffer() {
        let mut device = device();
        device.transmit(Bytes::from(&[0xAA, 0xBB, 0xCC])).unwrap();

        let record = device.rf().last_run(PropTx::id()).unwrap();
        assert_eq!(record.payload.as_deref(), Some(&[0xAA, 0xBB, 0xCC][..]));
        assert_eq!(device.rf().last_tx_params().unwrap().pkt_len, 3);
    }

    #[test]
    fn transmit_surfaces_failures() {
        let mut device = device();
        device
            .rf_mut()
            .push_reply(Reply::Status(CommandStatus::PropErrorTxUnf))
            .unwrap();
        assert_eq!(
            device.transmit(Bytes::from(&[1, 2])),
            Err(Error::Command(CommandStatus::PropErrorTxUnf))
        );

        let long = [0u8; 300];
        assert_eq!(
            device.transmit(Bytes::from(&long)),
            Err(Error::PacketTooLong(300))
        );
        assert_eq!(device.rf().run_count(), 1);

        device.rf_mut().set_fail_run(true);
        assert_eq!(
            device.transmit(Bytes::from(&[1])),
            Err(Error::Driver(MockError::Unavailable))
        );
    }

    #[test]
    fn send_then_receive() {
        let mut device = device();

        device
            .rf_mut()
            .push_reply(Reply::Status(CommandStatus::PropDoneOk))
            .unwrap();
        assert!(device.transmit(Bytes::from(&[0xAA, 0xBB, 0xCC])).is_ok());

        device.rf_mut().push_reply(Reply::packet(&[0x01, 0x02])).unwrap();
        let bytes = device.receive(1000);
        assert_eq!(bytes.as_slice(), &[0x01, 0x02]);
        assert_eq!(bytes.len(), 2);

        device
            .rf_mut()
            .push_reply(Reply::Status(CommandStatus::PropDoneRxTimeout))
            .unwrap();
        let bytes = device.receive(1000);
        assert_eq!(bytes.len(), 0);
        assert!(bytes.is_null());
    }
}
