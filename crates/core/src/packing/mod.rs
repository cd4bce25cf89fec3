//! Row assignment for overlay lanes and contiguous repacking for the program
//! lane.

use std::collections::HashMap;

use crate::clip::{Clip, ClipId, LaneKind};

/// Tolerance applied when comparing a row's end time with a clip start.
pub const OVERLAP_EPSILON: f64 = 1e-4;

/// Anything that occupies a `[start, start + duration)` interval.
pub trait Span {
    fn start(&self) -> f64;
    fn duration(&self) -> f64;

    fn end(&self) -> f64 {
        self.start() + self.duration()
    }
}

impl Span for Clip {
    fn start(&self) -> f64 {
        self.start
    }

    fn duration(&self) -> f64 {
        self.duration
    }
}

impl Span for (f64, f64) {
    fn start(&self) -> f64 {
        self.0
    }

    fn duration(&self) -> f64 {
        self.1
    }
}

/// Display rows for one lane. `rows[i]` is the row of the i-th input clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPacking {
    pub rows: Vec<usize>,
    pub row_count: usize,
}

impl RowPacking {
    pub fn row_of(&self, index: usize) -> Option<usize> {
        self.rows.get(index).copied()
    }
}

/// Greedy first-fit interval colouring.
///
/// Clips are visited by ascending start; identical starts keep their input
/// order. Each clip takes the lowest row whose last end is at or before its
/// start, or opens a new row.
pub fn pack_rows<T: Span>(spans: &[T]) -> RowPacking {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by(|&a, &b| spans[a].start().total_cmp(&spans[b].start()));

    let mut row_ends: Vec<f64> = Vec::new();
    let mut rows = vec![0; spans.len()];

    for index in order {
        let span = &spans[index];
        let row = match row_ends
            .iter()
            .position(|&end| end <= span.start() + OVERLAP_EPSILON)
        {
            Some(row) => row,
            None => {
                row_ends.push(f64::NEG_INFINITY);
                row_ends.len() - 1
            }
        };
        row_ends[row] = span.end();
        rows[index] = row;
    }

    RowPacking {
        rows,
        row_count: row_ends.len(),
    }
}

/// Assigns contiguous starts from zero in the current order.
pub fn repack_contiguous(clips: &mut [Clip]) {
    let mut cursor = 0.0;
    for clip in clips.iter_mut() {
        clip.start = cursor;
        cursor += clip.duration;
    }
}

/// Index at which a clip centred on `center` should be reinserted among
/// `remaining`, picking the closest cumulative boundary.
pub fn insertion_index(remaining: &[Clip], center: f64) -> usize {
    let mut best = 0;
    let mut best_distance = center.abs();
    let mut boundary = 0.0;
    for (index, clip) in remaining.iter().enumerate() {
        boundary += clip.duration;
        let distance = (center - boundary).abs();
        if distance < best_distance {
            best = index + 1;
            best_distance = distance;
        }
    }
    best
}

/// Structural identity of a lane: ids and exact geometry.
pub type StructuralKey = Vec<(ClipId, u64, u64)>;

pub fn structural_key(clips: &[Clip]) -> StructuralKey {
    clips
        .iter()
        .map(|clip| (clip.id.clone(), clip.start.to_bits(), clip.duration.to_bits()))
        .collect()
}

/// Memoizes [`pack_rows`] per lane so repeated renders of an unchanged lane
/// reuse the last assignment.
#[derive(Debug, Default)]
pub struct PackingCache {
    entries: HashMap<LaneKind, (StructuralKey, RowPacking)>,
    recomputes: usize,
}

impl PackingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packing(&mut self, lane: LaneKind, clips: &[Clip]) -> &RowPacking {
        let key = structural_key(clips);
        let stale = self
            .entries
            .get(&lane)
            .map(|(cached, _)| *cached != key)
            .unwrap_or(true);

        if stale {
            self.recomputes += 1;
            tracing::debug!(?lane, clips = clips.len(), "repacking lane rows");
            self.entries.insert(lane, (key, pack_rows(clips)));
        }

        &self.entries[&lane].1
    }

    /// Number of times a packing had to be recomputed.
    pub fn recomputes(&self) -> usize {
        self.recomputes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
