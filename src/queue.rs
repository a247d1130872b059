//! Receive ring
//!
//! Two fixed-size slots linked into a cycle. The RF core lands packets into the
//! slot at the head of the [`DataQueue`] descriptor, the driver consumes from
//! the slot under its own cursor. Slot ownership is carried by
//! [`EntryStatus`]: `Pending` slots belong to the RF core, `Finished` slots
//! hold a committed packet that belongs to the driver until it is taken.
//!
//! Links are indices, fixed at construction, so slot 0 is always followed by
//! slot 1 and slot 1 by slot 0.

use crate::bytes::Bytes;

/// Largest packet a ring slot can hold.
pub const MAX_PACKET_LENGTH: usize = 252;

/// Number of slots in the ring.
pub const QUEUE_LENGTH: usize = 2;

/// Ownership state of a ring slot (RF core data entry status)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryStatus {
    /// Writable by the RF core, no readable packet
    Pending = 0,
    /// The RF core is writing into the slot
    Active = 1,
    /// The RF core is done with the slot but it is still locked
    Busy = 2,
    /// Holds a committed, unread packet
    Finished = 3,
    /// Committed but truncated or otherwise incomplete
    Unfinished = 4,
}

/// One slot of the receive ring.
#[derive(Clone)]
pub struct QueueEntry {
    status: EntryStatus,
    next_entry: usize,
    length: usize,
    data: [u8; MAX_PACKET_LENGTH],
}

impl QueueEntry {
    const fn new(next_entry: usize) -> Self {
        Self {
            status: EntryStatus::Pending,
            next_entry,
            length: 0,
            data: [0; MAX_PACKET_LENGTH],
        }
    }

    /// Current ownership state.
    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// Index of the slot that follows this one.
    pub fn next_entry(&self) -> usize {
        self.next_entry
    }

    /// Bytes written by the RF core. Stale once the slot is back to `Pending`.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Slot capacity.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

/// Queue descriptor handed to the RF core with every receive command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataQueue {
    /// Slot the RF core writes next
    pub curr_entry: usize,
    /// Last slot of a linear queue, `None` for a ring
    pub last_entry: Option<usize>,
}

/// The two-slot receive ring.
#[derive(Clone)]
pub struct RxQueue {
    entries: [QueueEntry; QUEUE_LENGTH],
    descriptor: DataQueue,
    current: usize,
}

impl Default for RxQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RxQueue {
    /// Builds the ring with both slots pending and the cursor on slot 0.
    pub const fn new() -> Self {
        Self {
            entries: [QueueEntry::new(1), QueueEntry::new(0)],
            descriptor: DataQueue {
                curr_entry: 0,
                last_entry: None,
            },
            current: 0,
        }
    }

    /// The descriptor shared with the RF core.
    pub fn descriptor(&self) -> &DataQueue {
        &self.descriptor
    }

    /// Index of the slot the driver consumes next.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Slot by index.
    ///
    /// # Panics
    /// If `index >= QUEUE_LENGTH`.
    pub fn entry(&self, index: usize) -> &QueueEntry {
        &self.entries[index]
    }

    /// Returns true if the cursor slot holds a committed packet.
    pub fn has_committed(&self) -> bool {
        matches!(
            self.entries[self.current].status,
            EntryStatus::Finished | EntryStatus::Unfinished
        )
    }

    /// Hands out the cursor slot and advances the cursor.
    ///
    /// The slot goes back to `Pending` before the view is returned, so the
    /// view is only valid until the next receive command runs. The caller must
    /// have confirmed a successful receive for this slot, nothing is checked.
    pub fn take_next(&mut self) -> Bytes<'_> {
        let index = self.recycle_current();
        let entry = &self.entries[index];
        Bytes::new(&entry.data[..entry.length])
    }

    /// Recycles the cursor slot without reading it.
    pub fn discard_next(&mut self) {
        self.recycle_current();
    }

    fn recycle_current(&mut self) -> usize {
        let index = self.current;
        let entry = &mut self.entries[index];
        entry.status = EntryStatus::Pending;
        self.current = entry.next_entry;
        index
    }

    /// Lands a packet into the head slot, as the RF core does on reception.
    ///
    /// Returns false without writing if the head slot is not `Pending`.
    /// Packets longer than a slot are truncated and committed as `Unfinished`.
    pub fn land(&mut self, packet: &[u8]) -> bool {
        let index = self.descriptor.curr_entry;
        let entry = &mut self.entries[index];
        if entry.status != EntryStatus::Pending {
            return false;
        }

        let length = packet.len().min(entry.data.len());
        entry.data[..length].copy_from_slice(&packet[..length]);
        entry.length = length;
        entry.status = if length == packet.len() {
            EntryStatus::Finished
        } else {
            EntryStatus::Unfinished
        };
        self.descriptor.curr_entry = entry.next_entry;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ring_is_pending_and_cyclic() {
        let queue = RxQueue::new();
        for index in 0..QUEUE_LENGTH {
            let entry = queue.entry(index);
            assert_eq!(entry.status(), EntryStatus::Pending);
            assert_eq!(entry.length(), 0);
            assert_eq!(entry.capacity(), MAX_PACKET_LENGTH);
        }
        assert_eq!(queue.entry(0).next_entry(), 1);
        assert_eq!(queue.entry(1).next_entry(), 0);
        assert_eq!(
            *queue.descriptor(),
            DataQueue {
                curr_entry: 0,
                last_entry: None
            }
        );
        assert_eq!(queue.current(), 0);
        assert!(!queue.has_committed());
    }

    #[test]
    fn take_next_alternates_slots() {
        let mut queue = RxQueue::new();
        for round in 0..6u8 {
            assert!(queue.land(&[round, round + 1]));
            assert!(queue.has_committed());
            let expected_slot = usize::from(round) % 2;
            assert_eq!(queue.current(), expected_slot);
            let bytes = queue.take_next();
            assert_eq!(&*bytes, &[round, round + 1]);
        }
    }

    #[test]
    fn take_next_resets_status_to_pending() {
        let mut queue = RxQueue::new();
        queue.land(&[1, 2, 3]);
        assert_eq!(queue.entry(0).status(), EntryStatus::Finished);
        let _ = queue.take_next();
        assert_eq!(queue.entry(0).status(), EntryStatus::Pending);
        assert_eq!(queue.current(), 1);
    }

    #[test]
    fn land_refuses_when_ring_full() {
        let mut queue = RxQueue::new();
        assert!(queue.land(&[1]));
        assert!(queue.land(&[2]));
        assert!(!queue.land(&[3]));

        assert_eq!(&*queue.take_next(), &[1]);
        assert!(queue.land(&[3]));
        assert_eq!(&*queue.take_next(), &[2]);
        assert_eq!(&*queue.take_next(), &[3]);
    }

    #[test]
    fn oversize_packet_is_truncated() {
        let mut queue = RxQueue::new();
        let packet = [0x11u8; MAX_PACKET_LENGTH + 4];
        assert!(queue.land(&packet));
        assert_eq!(queue.entry(0).status(), EntryStatus::Unfinished);
        assert_eq!(queue.take_next().len(), MAX_PACKET_LENGTH);
    }

    #[test]
    fn discard_advances_cursor() {
        let mut queue = RxQueue::new();
        queue.land(&[9]);
        queue.discard_next();
        assert_eq!(queue.current(), 1);
        assert_eq!(queue.entry(0).status(), EntryStatus::Pending);
    }
}
