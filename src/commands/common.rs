//! Triggers, conditions and radio timer units
//!
//! Every RF core command carries a start trigger and a condition for
//! chaining. Receive and carrier-sense commands also carry an end trigger.
//! Times are expressed in radio timer ticks.

use super::DecodeError;

/// Radio timer ticks per millisecond.
pub const TICKS_PER_MS: u32 = 4000;

/// Converts milliseconds to radio timer ticks.
///
/// The timer fields are 32 bits wide; durations past `u32::MAX` ticks
/// (about 17.9 minutes) saturate instead of wrapping to a short deadline.
pub const fn ms_to_ticks(ms: u32) -> u32 {
    ms.saturating_mul(TICKS_PER_MS)
}

/// Trigger type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerType {
    /// Triggers immediately
    #[default]
    Now = 0,
    /// Never trigger
    Never = 1,
    /// Trigger at an absolute time
    AbsTime = 2,
    /// Trigger at a time relative to command submission
    RelSubmit = 3,
    /// Trigger at a time relative to command start
    RelStart = 4,
    /// Trigger at a time relative to the previous command start
    RelPrevStart = 5,
    /// Trigger at a time relative to the first command in the chain
    FirstStart = 6,
    /// Trigger at a time relative to the previous command end
    RelPrevEnd = 7,
    /// Trigger relative to event 1
    RelEvt1 = 8,
    /// Trigger relative to event 2
    RelEvt2 = 9,
    /// External trigger input
    External = 10,
}

impl TryFrom<u8> for TriggerType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Now,
            1 => Self::Never,
            2 => Self::AbsTime,
            3 => Self::RelSubmit,
            4 => Self::RelStart,
            5 => Self::RelPrevStart,
            6 => Self::FirstStart,
            7 => Self::RelPrevEnd,
            8 => Self::RelEvt1,
            9 => Self::RelEvt2,
            10 => Self::External,
            invalid => return Err(DecodeError::InvalidTrigger(invalid)),
        })
    }
}

/// Trigger descriptor
///
/// # Byte Format
/// - Bits 3:0: Trigger type
/// - Bit 4: Enable triggering by command
/// - Bits 6:5: Trigger number for command triggers
/// - Bit 7: Trigger immediately if the trigger time is in the past
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trigger {
    /// When the trigger fires
    pub trigger_type: TriggerType,
    /// Command triggering enabled
    pub enable_cmd: bool,
    /// Command trigger number (0-3)
    pub trigger_no: u8,
    /// Fire if the trigger time has already passed
    pub past_trig: bool,
}

impl Trigger {
    /// Trigger of the given type with all other fields cleared.
    pub const fn new(trigger_type: TriggerType) -> Self {
        Self {
            trigger_type,
            enable_cmd: false,
            trigger_no: 0,
            past_trig: false,
        }
    }

    pub(crate) fn to_byte(self) -> u8 {
        (self.trigger_type as u8 & 0x0F)
            | ((self.enable_cmd as u8) << 4)
            | ((self.trigger_no & 0x03) << 5)
            | ((self.past_trig as u8) << 7)
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        Ok(Self {
            trigger_type: TriggerType::try_from(byte & 0x0F)?,
            enable_cmd: byte & 0x10 != 0,
            trigger_no: (byte >> 5) & 0x03,
            past_trig: byte & 0x80 != 0,
        })
    }
}

/// Rule for running the next chained command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConditionRule {
    /// Always run the next command
    Always = 0,
    /// Never run a next command
    #[default]
    Never = 1,
    /// Stop if the command returned false
    StopOnFalse = 2,
    /// Stop if the command returned true
    StopOnTrue = 3,
    /// Skip commands if the command returned false
    SkipOnFalse = 4,
    /// Skip commands if the command returned true
    SkipOnTrue = 5,
}

impl TryFrom<u8> for ConditionRule {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Always,
            1 => Self::Never,
            2 => Self::StopOnFalse,
            3 => Self::StopOnTrue,
            4 => Self::SkipOnFalse,
            5 => Self::SkipOnTrue,
            invalid => return Err(DecodeError::InvalidCondition(invalid)),
        })
    }
}

/// Chaining condition
///
/// # Byte Format
/// - Bits 3:0: Rule
/// - Bits 7:4: Number of commands to skip for the skip rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Condition {
    /// Chaining rule
    pub rule: ConditionRule,
    /// Skip count
    pub skip: u8,
}

impl Condition {
    /// Condition with the given rule and no skip.
    pub const fn new(rule: ConditionRule) -> Self {
        Self { rule, skip: 0 }
    }

    pub(crate) fn to_byte(self) -> u8 {
        (self.rule as u8 & 0x0F) | ((self.skip & 0x0F) << 4)
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        Ok(Self {
            rule: ConditionRule::try_from(byte & 0x0F)?,
            skip: byte >> 4,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_4000_per_ms() {
        assert_eq!(ms_to_ticks(1), 4000);
        assert_eq!(ms_to_ticks(1000), 4_000_000);
        assert_eq!(ms_to_ticks(0), 0);
    }

    #[test]
    fn ticks_saturate() {
        assert_eq!(ms_to_ticks(u32::MAX), u32::MAX);
        assert_eq!(ms_to_ticks(1_073_741), 4_294_964_000);
        assert_eq!(ms_to_ticks(1_073_742), u32::MAX);
    }

    #[test]
    fn trigger_byte_layout() {
        let trigger = Trigger {
            trigger_type: TriggerType::RelStart,
            enable_cmd: true,
            trigger_no: 2,
            past_trig: true,
        };
        assert_eq!(trigger.to_byte(), 0x04 | 0x10 | 0x40 | 0x80);
        assert_eq!(Trigger::from_byte(trigger.to_byte()), Ok(trigger));
    }

    #[test]
    fn unknown_trigger_type_is_rejected() {
        assert_eq!(
            Trigger::from_byte(0x0F),
            Err(DecodeError::InvalidTrigger(0x0F))
        );
    }

    #[test]
    fn condition_byte_layout() {
        let condition = Condition {
            rule: ConditionRule::SkipOnTrue,
            skip: 3,
        };
        assert_eq!(condition.to_byte(), 0x35);
        assert_eq!(Condition::from_byte(0x35), Ok(condition));
        assert_eq!(Condition::new(ConditionRule::Never).to_byte(), 0x01);
    }
}
