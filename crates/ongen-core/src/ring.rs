//! Near-term command ring.
//!
//! One slot per fetch interval of the lookahead window. Slot `k` relative to
//! the head is consumed `k` fetches from now; the head advances once per
//! fetch.

use crate::command::Command;
use crate::error::{Error, Result};

/// Slots per channel ring.
pub const RING_CAPACITY: usize = 441;

/// Ticks between successive ring consumptions.
pub const FETCH_INTERVAL: u64 = 100;

/// Ticks covered by a full ring.
pub const LOOKAHEAD_TICKS: u64 = RING_CAPACITY as u64 * FETCH_INTERVAL;

/// Fixed-capacity circular command buffer indexed by future fetch offset.
#[derive(Clone, Debug)]
pub struct CommandRing {
    slots: [Command; RING_CAPACITY],
    head: usize,
}

impl Default for CommandRing {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRing {
    /// An empty ring with the head at slot 0.
    pub const fn new() -> Self {
        Self {
            slots: [Command::EMPTY; RING_CAPACITY],
            head: 0,
        }
    }

    /// Empty every slot and rewind the head.
    pub fn clear(&mut self) {
        self.slots = [Command::EMPTY; RING_CAPACITY];
        self.head = 0;
    }

    /// Physical index of the head slot.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Command `offset` fetches ahead of the head.
    pub fn peek(&self, offset: usize) -> Option<Command> {
        (offset < RING_CAPACITY).then(|| self.slots[(self.head + offset) % RING_CAPACITY])
    }

    /// Iterate pending commands in consumption order as `(offset, command)`.
    pub fn pending(&self) -> impl Iterator<Item = (usize, Command)> + '_ {
        (0..RING_CAPACITY)
            .map(|k| (k, self.slots[(self.head + k) % RING_CAPACITY]))
            .filter(|(_, cmd)| !cmd.is_empty())
    }

    /// Write `cmd` at `offset` from the head and empty every later slot up to
    /// the end of the window.
    ///
    /// Everything scheduled beyond `offset` is cancelled, so a refill never
    /// leaves stale commands behind. Slots before `offset` (and already
    /// consumed slots) are untouched.
    pub fn schedule_and_truncate(&mut self, offset: usize, cmd: Command) -> Result<()> {
        if offset >= RING_CAPACITY {
            return Err(Error::BufferFull {
                capacity: RING_CAPACITY,
            });
        }
        self.slots[(self.head + offset) % RING_CAPACITY] = cmd;
        for k in offset + 1..RING_CAPACITY {
            self.slots[(self.head + k) % RING_CAPACITY] = Command::EMPTY;
        }
        Ok(())
    }

    /// Take the head command, empty its slot, and advance the head.
    #[inline]
    pub fn consume_and_advance(&mut self) -> Command {
        let cmd = core::mem::take(&mut self.slots[self.head]);
        self.head = (self.head + 1) % RING_CAPACITY;
        cmd
    }
}
