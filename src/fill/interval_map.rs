use std::collections::BTreeMap;

use crate::error::FillError;
use crate::fill::Interval;

/// Where a frontier entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    /// Inserted through [`IntervalMap::insert_interval`], i.e. from outside
    /// the fill algorithm.
    Seeded,
    /// Generated by the engine while scanning.
    Discovered,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    interval: Interval,
    origin: Origin,
}

/// Row-bucketed frontier of pending intervals.
///
/// Each row holds its intervals in insertion order; [`pop_interval`] hands
/// out the most recent one first.  Intervals of one row never overlap or
/// touch: an insertion absorbs every entry it touches into one covering
/// interval.
///
/// [`pop_interval`]: IntervalMap::pop_interval
#[derive(Clone, Debug, Default)]
pub struct IntervalMap {
    rows: BTreeMap<i32, Vec<Entry>>,
}

impl IntervalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an interval from outside the engine.
    ///
    /// Such entries are held to a stricter contract than the ones the engine
    /// generates itself: if a forward span later swallows one completely the
    /// run fails with [`FillError::ConsistencyViolation`].
    pub fn insert_interval(&mut self, interval: Interval) {
        self.insert(interval, Origin::Seeded);
    }

    pub(crate) fn insert_discovered(&mut self, interval: Interval) {
        self.insert(interval, Origin::Discovered);
    }

    fn insert(&mut self, interval: Interval, origin: Origin) {
        let bucket = self.rows.entry(interval.row).or_default();
        let mut merged = Entry { interval, origin };

        // Entries of a row are disjoint, so absorbing them one at a time
        // reaches the transitive closure.
        while let Some(pos) = bucket
            .iter()
            .position(|e| e.interval.touches(&merged.interval))
        {
            let absorbed = bucket.remove(pos);
            merged.interval = merged.interval.merged(&absorbed.interval);
            if absorbed.origin == Origin::Seeded {
                merged.origin = Origin::Seeded;
            }
        }

        bucket.push(merged);
    }

    /// Pop the most recently inserted interval of `row`.
    pub fn pop_interval(&mut self, row: i32) -> Option<Interval> {
        let bucket = self.rows.get_mut(&row)?;
        let entry = bucket.pop();
        if bucket.is_empty() {
            self.rows.remove(&row);
        }
        entry.map(|e| e.interval)
    }

    /// Lowest row with pending intervals.
    pub fn first_row(&self) -> Option<i32> {
        self.rows.keys().next().copied()
    }

    /// Highest row with pending intervals.
    pub fn last_row(&self) -> Option<i32> {
        self.rows.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Every pending interval, ordered by row and then by start column.
    pub fn intervals(&self) -> Vec<Interval> {
        let mut out = Vec::with_capacity(self.len());
        for bucket in self.rows.values() {
            let first = out.len();
            out.extend(bucket.iter().map(|e| e.interval));
            out[first..].sort_by_key(|i| i.start);
        }
        out
    }

    /// Drain the map, returning its intervals in the order of [`intervals`].
    ///
    /// [`intervals`]: IntervalMap::intervals
    pub fn fetch_all_intervals(&mut self) -> Vec<Interval> {
        let out = self.intervals();
        self.rows.clear();
        out
    }

    /// Remove from `interval` every column already claimed on its row, and
    /// give up those claims in return: the forward span's source row covers
    /// the same columns, so expanding them backwards again is redundant.
    ///
    /// Returns the part of `interval` left to process, if any.  On error the
    /// map is left untouched.
    pub(crate) fn crop_interval(
        &mut self,
        interval: Interval,
    ) -> Result<Option<Interval>, FillError> {
        let Some(bucket) = self.rows.get(&interval.row) else {
            return Ok(Some(interval));
        };

        let mut entries = bucket.clone();
        let mut order: Vec<usize> = (0..entries.len())
            .filter(|&i| entries[i].interval.overlaps(&interval))
            .collect();
        if order.is_empty() {
            return Ok(Some(interval));
        }
        order.sort_by_key(|&i| entries[i].interval.start);

        let row = interval.row;
        let (mut start, mut end) = (interval.start, interval.end);
        let mut dropped = Vec::new();
        let mut split_off = Vec::new();
        let mut covered = false;

        for idx in order {
            if start > end {
                break;
            }
            let entry = &mut entries[idx];
            let claim = entry.interval;
            if claim.start > end || claim.end < start {
                continue;
            }
            let seeded = entry.origin == Origin::Seeded;
            let violation = || FillError::ConsistencyViolation {
                backward: claim,
                forward: Interval { start, end, row },
            };

            if claim.start <= start {
                // Claim covers the left edge of the span.  It is swallowed
                // only when no part survives on either side.
                let consumed = claim.start == start && claim.end <= end;
                if consumed && seeded {
                    return Err(violation());
                }
                if claim.end > end {
                    split_off.push(Entry {
                        interval: Interval::new(end + 1, claim.end, row),
                        origin: entry.origin,
                    });
                }
                if claim.start == start {
                    dropped.push(idx);
                } else {
                    entry.interval.end = start - 1;
                }
                if claim.end >= end {
                    covered = true;
                    break;
                }
                start = claim.end + 1;
            } else if claim.end >= end {
                // Claim covers the right edge of the span.
                let consumed = claim.end == end;
                if consumed && seeded {
                    return Err(violation());
                }
                if consumed {
                    dropped.push(idx);
                } else {
                    entry.interval.start = end + 1;
                }
                end = claim.start - 1;
            } else {
                // Claim lies strictly inside the span.
                if seeded {
                    return Err(violation());
                }
                dropped.push(idx);
            }
        }

        dropped.sort_unstable();
        for idx in dropped.into_iter().rev() {
            entries.remove(idx);
        }
        entries.extend(split_off);

        if entries.is_empty() {
            self.rows.remove(&row);
        } else {
            self.rows.insert(row, entries);
        }

        Ok((!covered && start <= end).then(|| Interval::new(start, end, row)))
    }
}
