// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Timer-class callbacks on a virtual millisecond clock.
//!
//! Timers fire in (due time, insertion order). The clock only moves when the
//! event loop pops a timer or is advanced explicitly, which keeps
//! "slow vs fast" races deterministic.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Handle returned by `set_timeout`, used to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub type TimerCallback = Box<dyn FnOnce()>;

pub struct TimerQueue {
    now_ms: u64,
    next_seq: u64,
    /// Keyed by (due, seq) so iteration order is firing order.
    entries: BTreeMap<(u64, u64), TimerCallback>,
    /// seq -> due for every entry, so cancel can build the key directly.
    due_by_seq: HashMap<u64, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            entries: BTreeMap::new(),
            due_by_seq: HashMap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `callback` to fire `delay_ms` after the current virtual time.
    pub fn schedule(&mut self, delay_ms: u64, callback: TimerCallback) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now_ms.saturating_add(delay_ms);
        self.entries.insert((due, seq), callback);
        self.due_by_seq.insert(seq, due);
        TimerId(seq)
    }

    /// Drop a pending timer. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_seq.remove(&id.0) {
            Some(due) => self.entries.remove(&(due, id.0)).is_some(),
            None => false,
        }
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest timer if it is due at or before `limit`, moving the
    /// clock to its due time.
    pub fn pop_due(&mut self, limit: u64) -> Option<(TimerId, TimerCallback)> {
        let key = *self.entries.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let callback = self.entries.remove(&key)?;
        self.due_by_seq.remove(&key.1);
        self.now_ms = self.now_ms.max(key.0);
        Some((TimerId(key.1), callback))
    }

    /// Pop the earliest timer regardless of due time.
    pub fn pop_next(&mut self) -> Option<(TimerId, TimerCallback)> {
        self.pop_due(u64::MAX)
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now_ms", &self.now_ms)
            .field("pending", &self.entries.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}
