//! Deferred gameplay events (windups, burst shots, beam ticks).
//!
//! Owned by the simulation state and drained only from `tick`, so ending a
//! match is a single `clear()` and nothing can fire into the next one.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::entities::{Side, WeaponKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Windup finished: run the weapon's fire routine
    Fire { side: Side, weapon: WeaponKind },
    /// One shot of a cannon burst
    CannonShot { side: Side, index: u32 },
    LaserTick { beam_id: u32 },
    LaserEnd { beam_id: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    at_ms: f64,
    seq: u64,
    event: Deferred,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap pops the earliest entry; ties go to insertion order
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at_ms
            .total_cmp(&self.at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn schedule(&mut self, at_ms: f64, event: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { at_ms, seq, event });
    }

    /// Pop the earliest event due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(f64, Deferred)> {
        if self.heap.peek()?.at_ms > now_ms {
            return None;
        }
        self.heap.pop().map(|e| (e.at_ms, e.event))
    }

    pub fn next_due(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.at_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn pending(&self) -> impl Iterator<Item = &Deferred> {
        self.heap.iter().map(|e| &e.event)
    }
}
