//! CLOCK (second-chance) replacement policy.
//!
//! A ring of per-frame records `{member, referenced}` and a sweep hand.
//! Unpinning a frame makes it a member with its reference bit set; the
//! sweep clears reference bits as it passes, so every member survives one
//! lap before it can be chosen.

use parking_lot::Mutex;

use super::super::frame::FrameId;
use super::Replacer;

#[derive(Clone, Copy, Default)]
struct Slot {
    member: bool,
    referenced: bool,
}

struct ClockInner {
    slots: Vec<Slot>,
    hand: usize,
    members: usize,
}

/// Second-chance ring over a fixed set of frames.
pub struct ClockReplacer {
    inner: Mutex<ClockInner>,
    capacity: usize,
}

impl ClockReplacer {
    /// Creates a replacer for frames `0..capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "clock replacer needs at least one frame");
        Self {
            inner: Mutex::new(ClockInner {
                slots: vec![Slot::default(); capacity],
                hand: 0,
                members: 0,
            }),
            capacity,
        }
    }

    fn check_bounds(&self, frame_id: FrameId) {
        assert!(
            frame_id.index() < self.capacity,
            "frame {} out of range for replacer of {} frames",
            frame_id.index(),
            self.capacity
        );
    }

    /// Removes the frame from the candidate set.
    pub fn pin(&self, frame_id: FrameId) {
        self.check_bounds(frame_id);
        let inner = &mut *self.inner.lock();
        let slot = &mut inner.slots[frame_id.index()];
        if slot.member {
            slot.member = false;
            inner.members -= 1;
        }
    }

    /// Adds the frame to the candidate set with a fresh reference bit.
    pub fn unpin(&self, frame_id: FrameId) {
        self.check_bounds(frame_id);
        let inner = &mut *self.inner.lock();
        let slot = &mut inner.slots[frame_id.index()];
        if !slot.member {
            slot.member = true;
            inner.members += 1;
        }
        slot.referenced = true;
    }

    /// Sweeps the ring and returns a victim, or `None` when no frame is a
    /// member.
    ///
    /// The sweep runs at most two laps: the first lap may spend every
    /// member's second chance, the second lap then finds a clear bit. The
    /// hand stays where it stopped, one past the victim.
    pub fn victim(&self) -> Option<FrameId> {
        let inner = &mut *self.inner.lock();
        if inner.members == 0 {
            return None;
        }
        for _ in 0..2 * self.capacity {
            let pos = inner.hand;
            inner.hand = (inner.hand + 1) % self.capacity;
            let slot = &mut inner.slots[pos];
            if !slot.member {
                continue;
            }
            if slot.referenced {
                slot.referenced = false;
                continue;
            }
            slot.member = false;
            inner.members -= 1;
            return Some(FrameId::new(pos));
        }
        None
    }

    /// Drops the frame from the ring without treating it as a victim.
    pub fn discard(&self, frame_id: FrameId) {
        self.check_bounds(frame_id);
        let inner = &mut *self.inner.lock();
        let slot = &mut inner.slots[frame_id.index()];
        if slot.member {
            slot.member = false;
            inner.members -= 1;
        }
        slot.referenced = false;
    }

    /// Returns the number of member frames.
    pub fn size(&self) -> usize {
        self.inner.lock().members
    }
}

impl Replacer for ClockReplacer {
    fn record_access(&self, frame_id: FrameId) {
        self.check_bounds(frame_id);
        let mut inner = self.inner.lock();
        let slot = &mut inner.slots[frame_id.index()];
        if slot.member {
            slot.referenced = true;
        }
    }

    fn pin(&self, frame_id: FrameId) {
        ClockReplacer::pin(self, frame_id);
    }

    fn unpin(&self, frame_id: FrameId) {
        ClockReplacer::unpin(self, frame_id);
    }

    fn evict(&self) -> Option<FrameId> {
        self.victim()
    }

    fn remove(&self, frame_id: FrameId) {
        self.discard(frame_id);
    }

    fn size(&self) -> usize {
        ClockReplacer::size(self)
    }
}

impl std::fmt::Debug for ClockReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ClockReplacer")
            .field("capacity", &self.capacity)
            .field("members", &inner.members)
            .field("hand", &inner.hand)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ring_has_no_victim() {
        let clock = ClockReplacer::new(3);
        assert_eq!(clock.victim(), None);
        assert_eq!(clock.size(), 0);
    }

    #[test]
    fn test_second_chance_full_lap() {
        // All three members carry a fresh reference bit; one victim() call
        // spends every second chance and then takes frame 0.
        let clock = ClockReplacer::new(3);
        for i in 0..3 {
            clock.unpin(FrameId::new(i));
        }
        assert_eq!(clock.size(), 3);

        assert_eq!(clock.victim(), Some(FrameId::new(0)));
        assert_eq!(clock.size(), 2);
    }

    #[test]
    fn test_victim_order_after_first_sweep() {
        let clock = ClockReplacer::new(3);
        for i in 0..3 {
            clock.unpin(FrameId::new(i));
        }
        // First call stripped all reference bits
        assert_eq!(clock.victim(), Some(FrameId::new(0)));
        assert_eq!(clock.victim(), Some(FrameId::new(1)));
        assert_eq!(clock.victim(), Some(FrameId::new(2)));
        assert_eq!(clock.victim(), None);
    }

    #[test]
    fn test_pin_removes_candidate() {
        let clock = ClockReplacer::new(3);
        clock.unpin(FrameId::new(0));
        clock.unpin(FrameId::new(1));

        clock.pin(FrameId::new(0));
        assert_eq!(clock.size(), 1);

        assert_eq!(clock.victim(), Some(FrameId::new(1)));
        assert_eq!(clock.victim(), None);
    }

    #[test]
    fn test_reaccess_grants_fresh_chance() {
        let clock = ClockReplacer::new(2);
        clock.unpin(FrameId::new(0));
        clock.unpin(FrameId::new(1));

        // Strip both reference bits
        assert_eq!(clock.victim(), Some(FrameId::new(0)));
        clock.unpin(FrameId::new(0));

        // Frame 0 was re-added with its bit set; frame 1's is clear
        assert_eq!(clock.victim(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_pin_is_idempotent() {
        let clock = ClockReplacer::new(2);
        clock.unpin(FrameId::new(0));
        clock.pin(FrameId::new(0));
        clock.pin(FrameId::new(0));
        assert_eq!(clock.size(), 0);

        clock.unpin(FrameId::new(0));
        clock.unpin(FrameId::new(0));
        assert_eq!(clock.size(), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_frame_panics() {
        let clock = ClockReplacer::new(2);
        clock.unpin(FrameId::new(2));
    }
}
