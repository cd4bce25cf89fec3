//! Selection state management
//!
//! Tracks single and multi-clip selection plus rectangular marquee selection
//! against rendered clip boxes.

use serde::{Deserialize, Serialize};

use crate::{
    clip::{ClipId, LaneKind},
    interaction::Viewport,
    timeline::Timeline,
};

/// One selected clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub lane: LaneKind,
    pub id: ClipId,
}

impl SelectionEntry {
    pub fn new(lane: LaneKind, id: impl Into<ClipId>) -> Self {
        Self {
            lane,
            id: id.into(),
        }
    }
}

/// Selection state for the editor
///
/// Kept apart from the timeline so it can be handed to rendering code without
/// mutable access to the clips.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
    /// Entry shown in the inspector.
    primary: Option<ClipId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection with a single clip.
    pub fn select_only(&mut self, lane: LaneKind, id: &str) {
        self.entries = vec![SelectionEntry::new(lane, id)];
        self.primary = Some(id.to_string());
    }

    /// Toggles a clip's membership; the most recently added clip becomes
    /// primary.
    pub fn toggle(&mut self, lane: LaneKind, id: &str) {
        if self.contains(id) {
            self.entries.retain(|entry| entry.id != id);
            if self.primary.as_deref() == Some(id) {
                self.primary = self.entries.last().map(|entry| entry.id.clone());
            }
        } else {
            self.entries.push(SelectionEntry::new(lane, id));
            self.primary = Some(id.to_string());
        }
    }

    /// Replaces the selection with `entries`, keeping the current primary if
    /// it is still part of it.
    pub fn set(&mut self, entries: Vec<SelectionEntry>) {
        let mut deduped: Vec<SelectionEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !deduped.contains(&entry) {
                deduped.push(entry);
            }
        }
        let keep_primary = self
            .primary
            .as_deref()
            .map(|id| deduped.iter().any(|entry| entry.id == id))
            .unwrap_or(false);
        if !keep_primary {
            self.primary = deduped.first().map(|entry| entry.id.clone());
        }
        self.entries = deduped;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.primary = None;
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops entries whose clips no longer exist. Returns how many were
    /// removed.
    pub fn retain_existing(&mut self, timeline: &Timeline) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| timeline.contains(&entry.id));
        if let Some(primary) = &self.primary {
            if !timeline.contains(primary) {
                self.primary = None;
            }
        }
        before - self.entries.len()
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two corners.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains_point(&self, point: (f64, f64)) -> bool {
        point.0 >= self.x && point.0 <= self.right() && point.1 >= self.y && point.1 <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Screen-space bounding box of a rendered clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipBox {
    pub lane: LaneKind,
    pub id: ClipId,
    pub rect: Rect,
}

/// Clips hit by `marquee` (content coordinates). Boxes are given in client
/// coordinates and mapped through the viewport; clips in `excluded` are
/// mid-interaction and ignored.
pub fn marquee_hits(
    marquee: &Rect,
    boxes: &[ClipBox],
    viewport: &Viewport,
    excluded: Option<&str>,
) -> Vec<SelectionEntry> {
    let center = marquee.center();
    boxes
        .iter()
        .filter(|clip_box| excluded != Some(clip_box.id.as_str()))
        .filter(|clip_box| {
            let content = clip_box.rect.translate(
                viewport.scroll_left - viewport.left,
                viewport.scroll_top - viewport.top,
            );
            content.intersects(marquee) || content.contains_point(center)
        })
        .map(|clip_box| SelectionEntry::new(clip_box.lane, clip_box.id.clone()))
        .collect()
}

/// Rubber-band selection started on empty canvas.
#[derive(Debug, Clone)]
pub struct Marquee {
    origin: (f64, f64),
    current: (f64, f64),
    dragged: bool,
    additive: bool,
    base: Vec<SelectionEntry>,
}

impl Marquee {
    /// Starts at a content-space point. Additive marquees extend the
    /// selection that existed when they began.
    pub fn begin(origin: (f64, f64), additive: bool, selection: &Selection) -> Self {
        Self {
            origin,
            current: origin,
            dragged: false,
            additive,
            base: if additive {
                selection.entries().to_vec()
            } else {
                Vec::new()
            },
        }
    }

    /// Moves the free corner. The marquee only becomes active once the
    /// pointer travels past `slop` pixels.
    pub fn update(&mut self, point: (f64, f64), slop: f64) {
        self.current = point;
        let (dx, dy) = (point.0 - self.origin.0, point.1 - self.origin.1);
        if dx.abs() > slop || dy.abs() > slop {
            self.dragged = true;
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.origin, self.current)
    }

    pub fn is_dragged(&self) -> bool {
        self.dragged
    }

    /// Recomputes the selection from the current rectangle.
    pub fn apply(
        &self,
        selection: &mut Selection,
        boxes: &[ClipBox],
        viewport: &Viewport,
        excluded: Option<&str>,
    ) {
        if !self.dragged {
            return;
        }
        let mut entries = self.base.clone();
        entries.extend(marquee_hits(&self.rect(), boxes, viewport, excluded));
        selection.set(entries);
    }

    /// Finishes the marquee. A press on empty canvas that never turned into
    /// a drag clears the selection.
    pub fn finish(self, selection: &mut Selection) {
        if !self.dragged && !self.additive {
            selection.clear();
        }
    }
}
