//! Far-term command log.
//!
//! A [`SequenceLog`] is a bounded, append-only list of `(tick, command)`
//! pairs in non-decreasing tick order, with a read cursor and an optional
//! loop region. Once per render call the engine moves every entry that
//! falls inside the lookahead window into the channel's
//! [`CommandRing`](crate::ring::CommandRing).
//!
//! # Looping
//!
//! With a loop region `[first, last]` spanning `[start_tick, end_tick)`, the
//! cursor keeps counting past `last`; the effective index wraps back into
//! the region and each wrap adds `end_tick - start_tick` to the stored tick.
//! A finite region therefore plays forever without duplicating entries.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::ring::{CommandRing, FETCH_INTERVAL, LOOKAHEAD_TICKS};

/// Maximum entries examined per fill.
pub const FILL_SCAN_LIMIT: usize = 441;

/// One scheduled command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceEntry {
    /// Absolute tick at which the command applies.
    pub tick: u64,
    /// The command.
    pub command: Command,
}

/// Loop region of a [`SequenceLog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopRegion {
    /// First entry index inside the loop.
    pub first: usize,
    /// Last entry index inside the loop (inclusive).
    pub last: usize,
    /// Tick at which the loop starts.
    pub start_tick: u64,
    /// Tick at which the loop jumps back to `start_tick`.
    pub end_tick: u64,
}

impl LoopRegion {
    fn len(&self) -> usize {
        self.last - self.first + 1
    }

    fn span(&self) -> u64 {
        self.end_tick - self.start_tick
    }
}

/// Bounded, tick-ordered command log with a monotonic read cursor.
#[derive(Clone, Debug, Default)]
pub struct SequenceLog {
    entries: Vec<SequenceEntry>,
    capacity: usize,
    cursor: usize,
    loop_region: Option<LoopRegion>,
}

impl SequenceLog {
    /// An empty log that accepts up to `capacity` entries.
    ///
    /// The storage is reserved up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            loop_region: None,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries written.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    /// Logical read position (keeps growing while looping).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Configured loop region, if any.
    pub fn loop_region(&self) -> Option<LoopRegion> {
        self.loop_region
    }

    /// Tick of the last entry, if any.
    pub fn last_tick(&self) -> Option<u64> {
        self.entries.last().map(|e| e.tick)
    }

    /// Append `command` at `tick`.
    ///
    /// Ticks must not decrease; a full log rejects the entry with
    /// [`Error::BufferFull`].
    pub fn append(&mut self, tick: u64, command: Command) -> Result<()> {
        if self.entries.len() >= self.capacity {
            return Err(Error::BufferFull {
                capacity: self.capacity,
            });
        }
        if self.last_tick().is_some_and(|last| tick < last) {
            return Err(Error::Malformed("sequence ticks must not decrease"));
        }
        self.entries.push(SequenceEntry { tick, command });
        Ok(())
    }

    /// Drop every entry and the loop region, and rewind the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.loop_region = None;
    }

    /// Rewind the cursor to the first entry.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Loop entries `first..=last` over ticks `[start_tick, end_tick)`.
    pub fn set_loop_region(
        &mut self,
        first: usize,
        last: usize,
        start_tick: u64,
        end_tick: u64,
    ) -> Result<()> {
        if first > last {
            return Err(Error::Malformed("loop region first index after last"));
        }
        if last >= self.entries.len() {
            return Err(Error::out_of_range("loop last index", last));
        }
        if end_tick <= start_tick {
            return Err(Error::Malformed("loop region must span at least one tick"));
        }
        self.loop_region = Some(LoopRegion {
            first,
            last,
            start_tick,
            end_tick,
        });
        Ok(())
    }

    /// Remove the loop region; the cursor plays on linearly.
    pub fn clear_loop_region(&mut self) {
        self.loop_region = None;
    }

    /// Entry at logical position `position`, with the loop offset applied to
    /// its tick. `None` past the end of a non-looping log.
    pub fn logical_entry(&self, position: usize) -> Option<SequenceEntry> {
        match self.loop_region {
            Some(region) if position >= region.first => {
                let k = position - region.first;
                let wraps = (k / region.len()) as u64;
                let entry = self.entries.get(region.first + k % region.len())?;
                Some(SequenceEntry {
                    tick: entry.tick.saturating_add(wraps.saturating_mul(region.span())),
                    command: entry.command,
                })
            }
            _ => self.entries.get(position).copied(),
        }
    }

    /// Move every entry due in `[current_tick, current_tick + lookahead)` into
    /// `ring`, advancing the cursor past them.
    ///
    /// Entries before `current_tick` are stale and skipped. The walk stops at
    /// the first entry past the window (it is revisited on a later call) or
    /// after [`FILL_SCAN_LIMIT`] entries. Returns the number scheduled.
    pub fn fill(&mut self, current_tick: u64, ring: &mut CommandRing) -> usize {
        let end_tick = current_tick.saturating_add(LOOKAHEAD_TICKS);
        let mut scheduled = 0;

        for _ in 0..FILL_SCAN_LIMIT {
            let Some(entry) = self.logical_entry(self.cursor) else {
                break;
            };
            if entry.tick >= end_tick {
                break;
            }
            if entry.tick >= current_tick {
                let offset = ((entry.tick - current_tick) / FETCH_INTERVAL) as usize;
                if ring.schedule_and_truncate(offset, entry.command).is_ok() {
                    scheduled += 1;
                }
            }
            self.cursor += 1;
        }

        scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RING_CAPACITY;

    fn log_of(ticks: &[u64]) -> SequenceLog {
        let mut log = SequenceLog::with_capacity(ticks.len());
        for (i, &t) in ticks.iter().enumerate() {
            log.append(t, Command::key_on(i as u8 + 1)).unwrap();
        }
        log
    }

    #[test]
    fn test_append_respects_capacity() {
        let mut log = SequenceLog::with_capacity(2);
        log.append(0, Command::key_on(1)).unwrap();
        log.append(10, Command::key_off()).unwrap();
        assert_eq!(
            log.append(20, Command::key_on(2)),
            Err(Error::BufferFull { capacity: 2 })
        );
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_append_rejects_decreasing_ticks() {
        let mut log = SequenceLog::with_capacity(4);
        log.append(100, Command::key_on(1)).unwrap();
        log.append(100, Command::key_off()).unwrap();
        assert!(matches!(
            log.append(99, Command::key_on(2)),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_fill_schedules_window() {
        let mut log = log_of(&[0, 250, 1000]);
        let mut ring = CommandRing::new();
        assert_eq!(log.fill(0, &mut ring), 3);
        assert_eq!(log.cursor(), 3);
        let offsets: Vec<_> = ring.pending().map(|(k, _)| k).collect();
        assert_eq!(offsets, vec![0, 2, 10]);
    }

    #[test]
    fn test_fill_stops_at_window_end() {
        let mut log = log_of(&[100, LOOKAHEAD_TICKS, LOOKAHEAD_TICKS + 500]);
        let mut ring = CommandRing::new();
        assert_eq!(log.fill(0, &mut ring), 1);
        assert_eq!(log.cursor(), 1);

        // Later call picks up the deferred entries.
        let mut ring = CommandRing::new();
        assert_eq!(log.fill(1000, &mut ring), 2);
        assert_eq!(log.cursor(), 3);
    }

    #[test]
    fn test_fill_skips_stale_entries() {
        let mut log = log_of(&[0, 50, 5000]);
        let mut ring = CommandRing::new();
        assert_eq!(log.fill(1000, &mut ring), 1);
        assert_eq!(log.cursor(), 3);
        assert_eq!(ring.peek(40), Some(Command::key_on(3)));
    }

    #[test]
    fn test_fill_is_bounded_per_call() {
        let mut log = SequenceLog::with_capacity(1000);
        for i in 0..1000 {
            log.append(i * 10, Command::key_off()).unwrap();
        }
        let mut ring = CommandRing::new();
        log.fill(0, &mut ring);
        assert_eq!(log.cursor(), FILL_SCAN_LIMIT);
    }

    #[test]
    fn test_fill_without_entries_is_noop() {
        let mut log = SequenceLog::with_capacity(8);
        let mut ring = CommandRing::new();
        assert_eq!(log.fill(0, &mut ring), 0);
        assert_eq!(ring.pending().count(), 0);
    }

    #[test]
    fn test_loop_region_validation() {
        let mut log = log_of(&[0, 100, 200]);
        assert!(log.set_loop_region(2, 1, 0, 300).is_err());
        assert!(log.set_loop_region(0, 3, 0, 300).is_err());
        assert!(log.set_loop_region(0, 2, 300, 300).is_err());
        assert!(log.set_loop_region(0, 2, 0, 300).is_ok());
    }

    #[test]
    fn test_logical_entry_wraps() {
        let mut log = log_of(&[0, 100, 300]);
        log.set_loop_region(1, 2, 100, 500).unwrap();

        let ticks: Vec<u64> = (0..7).map(|p| log.logical_entry(p).unwrap().tick).collect();
        assert_eq!(ticks, vec![0, 100, 300, 500, 700, 900, 1100]);
        assert_eq!(log.logical_entry(3).unwrap().command, Command::key_on(2));
    }

    #[test]
    fn test_loop_fill_repeats_with_span_period() {
        let mut log = log_of(&[100, 300]);
        log.set_loop_region(0, 1, 100, 500).unwrap();
        let mut ring = CommandRing::new();
        let scheduled = log.fill(0, &mut ring);

        // Ticks 100, 300, 500, ... below LOOKAHEAD_TICKS.
        assert_eq!(scheduled, ((LOOKAHEAD_TICKS - 100) / 200) as usize);
        let pending: Vec<_> = ring.pending().take(6).collect();
        assert_eq!(
            pending,
            vec![
                (1, Command::key_on(1)),
                (3, Command::key_on(2)),
                (5, Command::key_on(1)),
                (7, Command::key_on(2)),
                (9, Command::key_on(1)),
                (11, Command::key_on(2)),
            ]
        );
        assert!(ring.pending().all(|(k, _)| k < RING_CAPACITY));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut log = log_of(&[0, 100]);
        log.set_loop_region(0, 1, 0, 200).unwrap();
        let mut ring = CommandRing::new();
        log.fill(0, &mut ring);
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.cursor(), 0);
        assert_eq!(log.loop_region(), None);
    }
}
