//! Per-timestamp hit slots with O(1) lookup and arrival-order eviction.
//!
//! The map and the FIFO are owned together and only mutated through
//! [`SlotLedger::record`] and [`SlotLedger::evict_oldest`], so they cannot
//! drift apart. The FIFO holds one key per distinct timestamp, which bounds
//! its length by the number of distinct timestamps in the trailing window
//! rather than by hit volume.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use crate::types::TimeSlot;

#[derive(Debug, Clone, Default)]
pub struct SlotLedger {
    slots_by_time: HashMap<i64, TimeSlot>,
    /// Slot keys in the order each slot was first created.
    arrival_order: VecDeque<i64>,
    /// Sum of `count` over `slots_by_time`, maintained incrementally.
    total_hits: u64,
}

impl SlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one hit at `timestamp`, creating its slot on first sight.
    /// Returns the slot after the update.
    pub fn record(&mut self, timestamp: i64) -> TimeSlot {
        self.total_hits += 1;
        match self.slots_by_time.entry(timestamp) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                slot.count += 1;
                *slot
            }
            Entry::Vacant(entry) => {
                self.arrival_order.push_back(timestamp);
                *entry.insert(TimeSlot::new(timestamp))
            }
        }
    }

    /// Earliest-inserted slot, without removing it.
    pub fn oldest(&self) -> Option<TimeSlot> {
        let key = self.arrival_order.front()?;
        self.slots_by_time.get(key).copied()
    }

    /// Remove the earliest-inserted slot and subtract its hits from the total.
    pub fn evict_oldest(&mut self) -> Option<TimeSlot> {
        let key = self.arrival_order.pop_front()?;
        let slot = self.slots_by_time.remove(&key)?;
        self.total_hits -= slot.count;
        Some(slot)
    }

    pub fn get(&self, timestamp: i64) -> Option<TimeSlot> {
        self.slots_by_time.get(&timestamp).copied()
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    /// Number of distinct timestamps held.
    pub fn len(&self) -> usize {
        self.arrival_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrival_order.is_empty()
    }

    /// Slots in arrival order (front is evicted first).
    pub fn iter(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.arrival_order
            .iter()
            .filter_map(|key| self.slots_by_time.get(key).copied())
    }

    /// Recompute the total by summation and compare it with the running
    /// counter. Used by debug builds after every consume and by tests.
    pub fn is_consistent(&self) -> bool {
        let summed: u64 = self.slots_by_time.values().map(|s| s.count).sum();
        summed == self.total_hits
            && self.slots_by_time.len() == self.arrival_order.len()
            && self
                .arrival_order
                .iter()
                .all(|key| self.slots_by_time.contains_key(key))
    }
}
