//! One-shot deferred actions on the game clock
//!
//! Every timer is stamped with the queue's generation at scheduling time.
//! `clear` bumps the generation, so a timer that somehow survives a restart
//! is discarded instead of firing into the new game.

use serde::{Deserialize, Serialize};

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Drop cooldown over: offer the next pending piece
    SpawnPending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    due_ms: f64,
    /// Scheduling order, breaks ties between equal due times
    seq: u64,
    generation: u32,
    kind: TimerKind,
}

#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    generation: u32,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Fire `kind` once the clock reaches `due_ms`
    pub fn schedule(&mut self, due_ms: f64, kind: TimerKind) {
        let timer = Timer {
            due_ms,
            seq: self.next_seq,
            generation: self.generation,
            kind,
        };
        self.next_seq += 1;
        self.timers.push(timer);
    }

    /// Remove and return every timer due at `now_ms`, earliest first
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<TimerKind> {
        let generation = self.generation;
        let (mut due, rest): (Vec<Timer>, Vec<Timer>) = self
            .timers
            .drain(..)
            .partition(|t| t.due_ms <= now_ms);
        self.timers = rest;

        due.retain(|t| t.generation == generation);
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|t| t.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Cancel everything and invalidate anything scheduled before now
    pub fn clear(&mut self) {
        self.timers.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}
