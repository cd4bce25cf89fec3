//! Authoritative in-memory clip store.

use std::collections::BTreeMap;

use crate::{
    clip::{Clip, ClipId, LaneKind},
    packing::{insertion_index, repack_contiguous, PackingCache, RowPacking},
    Result, TimelineError,
};

/// Ordered clips of a single kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    kind: LaneKind,
    clips: Vec<Clip>,
}

impl Lane {
    pub fn new(kind: LaneKind) -> Self {
        Self {
            kind,
            clips: Vec::new(),
        }
    }

    pub fn kind(&self) -> LaneKind {
        self.kind
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.id == id)
    }

    /// Latest end time in the lane.
    pub fn span(&self) -> f64 {
        self.clips.iter().map(Clip::end).fold(0.0, f64::max)
    }

    fn normalize(&mut self) {
        if self.kind.is_program() {
            repack_contiguous(&mut self.clips);
        }
    }
}

/// All lanes of a project plus the optimistic-concurrency revision.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    lanes: BTreeMap<LaneKind, Lane>,
    fps: f64,
    revision: u64,
}

impl Timeline {
    pub fn new(fps: f64) -> Self {
        let lanes = LaneKind::ALL
            .into_iter()
            .map(|kind| (kind, Lane::new(kind)))
            .collect();
        Self {
            lanes,
            fps,
            revision: 0,
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Adopts the revision acknowledged by the remote store.
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    pub fn lane(&self, kind: LaneKind) -> &Lane {
        &self.lanes[&kind]
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    fn lane_mut(&mut self, kind: LaneKind) -> &mut Lane {
        self.lanes
            .entry(kind)
            .or_insert_with(|| Lane::new(kind))
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.lanes.values().flat_map(|lane| lane.clips.iter())
    }

    pub fn clip_count(&self) -> usize {
        self.lanes.values().map(Lane::len).sum()
    }

    pub fn find(&self, id: &str) -> Option<&Clip> {
        self.clips().find(|clip| clip.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn lane_of(&self, id: &str) -> Option<LaneKind> {
        self.find(id).map(Clip::lane)
    }

    /// Maximum end time across every lane.
    pub fn total_duration(&self) -> f64 {
        self.lanes.values().map(Lane::span).fold(0.0, f64::max)
    }

    /// Summed durations of the program lane.
    pub fn program_span(&self) -> f64 {
        self.lane(LaneKind::Program)
            .clips
            .iter()
            .map(|clip| clip.duration)
            .sum()
    }

    pub fn shortest_clip(&self) -> Option<f64> {
        self.clips()
            .map(|clip| clip.duration)
            .min_by(f64::total_cmp)
    }

    /// Produces an id derived from `base` that is not used yet.
    pub fn fresh_id(&self, base: &str) -> ClipId {
        (1..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Adds a clip to the lane matching its payload. Program clips are
    /// appended at the end of the queue.
    pub fn insert(&mut self, clip: Clip) -> Result<()> {
        let index = self.lane(clip.lane()).len();
        self.insert_at(index, clip)
    }

    /// Inserts a clip at `index` within its lane. Program lane starts are
    /// rederived afterwards.
    pub fn insert_at(&mut self, index: usize, clip: Clip) -> Result<()> {
        let clip = clip
            .sanitized()
            .ok_or_else(|| TimelineError::msg("clip needs an id and a positive duration"))?;
        if self.contains(&clip.id) {
            return Err(TimelineError::msg(format!("duplicate clip id `{}`", clip.id)));
        }

        let lane = self.lane_mut(clip.lane());
        let index = index.min(lane.clips.len());
        tracing::debug!(id = %clip.id, lane = ?lane.kind, index, "inserting clip");
        lane.clips.insert(index, clip);
        lane.normalize();
        Ok(())
    }

    /// Inserts a program clip at the boundary closest to `center`.
    pub fn insert_program_near(&mut self, clip: Clip, center: f64) -> Result<()> {
        let index = insertion_index(self.lane(LaneKind::Program).clips(), center);
        self.insert_at(index, clip)
    }

    pub fn remove(&mut self, id: &str) -> Result<Clip> {
        let kind = self
            .lane_of(id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        let lane = self.lane_mut(kind);
        let index = lane
            .position(id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        let removed = lane.clips.remove(index);
        lane.normalize();
        tracing::debug!(id, lane = ?kind, "removed clip");
        Ok(removed)
    }

    /// Swaps one clip for a run of replacements at the same position. The
    /// lane is normalized once, after every piece is in place.
    pub fn replace(&mut self, id: &str, replacements: Vec<Clip>) -> Result<()> {
        let kind = self
            .lane_of(id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        for clip in &replacements {
            if clip.lane() != kind {
                return Err(TimelineError::msg("replacement clips must stay on the same lane"));
            }
            if clip.id != id && self.contains(&clip.id) {
                return Err(TimelineError::msg(format!("duplicate clip id `{}`", clip.id)));
            }
        }

        let lane = self.lane_mut(kind);
        let index = lane
            .position(id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        lane.clips.splice(index..=index, replacements);
        lane.normalize();
        Ok(())
    }

    /// Applies new geometry to a clip. Program clips only take the duration
    /// and source offset; their start stays derived from lane order.
    pub fn set_geometry(
        &mut self,
        id: &str,
        start: f64,
        duration: f64,
        source_in: f64,
    ) -> Result<()> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(TimelineError::msg("clip duration must be positive"));
        }
        let kind = self
            .lane_of(id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        let lane = self.lane_mut(kind);
        if let Some(clip) = lane.clips.iter_mut().find(|clip| clip.id == id) {
            clip.start = start.max(0.0);
            clip.duration = duration;
            clip.source_in = source_in.max(0.0);
        }
        lane.normalize();
        Ok(())
    }

    /// Moves a program clip to the slot whose boundary is nearest to the
    /// dropped centre position, then repacks.
    pub fn reorder_program(&mut self, id: &str, center: f64) -> Result<usize> {
        let lane = self.lane_mut(LaneKind::Program);
        let from = lane
            .position(id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        let clip = lane.clips.remove(from);
        let to = insertion_index(&lane.clips, center);
        lane.clips.insert(to, clip);
        lane.normalize();
        tracing::debug!(id, from, to, "reordered program clip");
        Ok(to)
    }

    /// Mutable access to non-geometric clip fields. The id and the payload
    /// kind are fixed; an update that changes either is rolled back.
    pub fn update<F>(&mut self, id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Clip),
    {
        let kind = self
            .lane_of(id)
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        let lane = self.lane_mut(kind);
        if let Some(clip) = lane.clips.iter_mut().find(|clip| clip.id == id) {
            let original = clip.clone();
            apply(clip);
            clip.start = original.start;
            clip.duration = original.duration;
            if clip.lane() != kind || clip.id != original.id {
                *clip = original;
                return Err(TimelineError::msg(format!(
                    "update of `{id}` may not change its kind or id"
                )));
            }
        }
        Ok(())
    }

    /// Row assignment for an overlay lane, cached by lane structure.
    pub fn rows<'a>(&self, kind: LaneKind, cache: &'a mut PackingCache) -> &'a RowPacking {
        cache.packing(kind, self.lane(kind).clips())
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipPayload;
    use proptest::prelude::*;

    fn starts(timeline: &Timeline) -> Vec<f64> {
        timeline
            .lane(LaneKind::Program)
            .clips()
            .iter()
            .map(|clip| clip.start)
            .collect()
    }

    fn three_clips() -> Timeline {
        let mut timeline = Timeline::new(30.0);
        timeline.insert(Clip::video("a", 5.0)).unwrap();
        timeline.insert(Clip::video("b", 3.0)).unwrap();
        timeline.insert(Clip::video("c", 4.0)).unwrap();
        timeline
    }

    #[test]
    fn program_inserts_are_contiguous() {
        let timeline = three_clips();
        assert_eq!(starts(&timeline), vec![0.0, 5.0, 8.0]);
        assert_eq!(timeline.total_duration(), 12.0);
        assert_eq!(timeline.program_span(), 12.0);
    }

    #[test]
    fn explicit_program_starts_are_ignored() {
        let mut timeline = Timeline::default();
        timeline.insert(Clip::video("a", 2.0).at(40.0)).unwrap();
        assert_eq!(starts(&timeline), vec![0.0]);
    }

    #[test]
    fn removing_closes_the_gap() {
        let mut timeline = three_clips();
        timeline.remove("b").unwrap();
        assert_eq!(starts(&timeline), vec![0.0, 5.0]);
        assert!(matches!(
            timeline.remove("b"),
            Err(TimelineError::ClipNotFound(_))
        ));
    }

    #[test]
    fn overlays_keep_explicit_starts_and_extend_duration() {
        let mut timeline = three_clips();
        timeline.insert(Clip::audio("music", 6.0).at(10.0)).unwrap();
        assert_eq!(timeline.find("music").unwrap().start, 10.0);
        assert_eq!(timeline.total_duration(), 16.0);
    }

    #[test]
    fn rejects_duplicate_and_empty_clips() {
        let mut timeline = three_clips();
        assert!(timeline.insert(Clip::audio("a", 1.0)).is_err());
        assert!(timeline.insert(Clip::audio("z", 0.0)).is_err());
        assert_eq!(timeline.clip_count(), 3);
    }

    #[test]
    fn reorders_by_dropped_center() {
        let mut timeline = three_clips();
        // "a" dropped centred at 11s lands after "c"
        let index = timeline.reorder_program("a", 11.0).unwrap();
        assert_eq!(index, 2);
        let ids: Vec<_> = timeline
            .lane(LaneKind::Program)
            .clips()
            .iter()
            .map(|clip| clip.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(starts(&timeline), vec![0.0, 3.0, 7.0]);
    }

    #[test]
    fn geometry_changes_repack_program_lane() {
        let mut timeline = three_clips();
        timeline.set_geometry("a", 3.0, 6.0, 0.5).unwrap();
        assert_eq!(starts(&timeline), vec![0.0, 6.0, 9.0]);
        assert_eq!(timeline.find("a").unwrap().source_in, 0.5);
    }

    #[test]
    fn fresh_ids_avoid_collisions() {
        let mut timeline = three_clips();
        timeline.insert(Clip::audio("a-1", 1.0)).unwrap();
        assert_eq!(timeline.fresh_id("a"), "a-2");
    }

    #[test]
    fn update_cannot_move_clips() {
        let mut timeline = three_clips();
        timeline
            .update("b", |clip| {
                clip.label = "Intro".into();
                clip.start = 99.0;
            })
            .unwrap();
        let clip = timeline.find("b").unwrap();
        assert_eq!(clip.label, "Intro");
        assert_eq!(clip.start, 5.0);
    }

    #[test]
    fn update_cannot_change_lane_kind() {
        let mut timeline = three_clips();
        let result = timeline.update("b", |clip| {
            clip.label = "Narration".into();
            clip.payload = ClipPayload::Caption {
                text: "hello".into(),
                voice: None,
            };
        });
        assert!(result.is_err());

        let clip = timeline.find("b").unwrap();
        assert_eq!(clip.lane(), LaneKind::Program);
        assert_eq!(clip.label, "");
        assert_eq!(timeline.lane_of("b"), Some(LaneKind::Program));
        timeline.remove("b").unwrap();
        assert_eq!(starts(&timeline), vec![0.0, 5.0]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(f64),
        Remove(usize),
        Split(usize, f64),
        Reorder(usize, f64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.1f64..20.0).prop_map(Op::Insert),
            any::<usize>().prop_map(Op::Remove),
            (any::<usize>(), 0.0f64..1.0).prop_map(|(index, ratio)| Op::Split(index, ratio)),
            (any::<usize>(), 0.0f64..200.0).prop_map(|(index, center)| Op::Reorder(index, center)),
        ]
    }

    fn program_id(timeline: &Timeline, index: usize) -> Option<(ClipId, f64, f64)> {
        let clips = timeline.lane(LaneKind::Program).clips();
        if clips.is_empty() {
            return None;
        }
        let clip = &clips[index % clips.len()];
        Some((clip.id.clone(), clip.start, clip.duration))
    }

    proptest! {
        #[test]
        fn program_lane_stays_contiguous_under_edits(ops in prop::collection::vec(op(), 1..60)) {
            let mut timeline = Timeline::new(30.0);
            for op in ops {
                match op {
                    Op::Insert(duration) => {
                        let id = timeline.fresh_id("clip");
                        timeline.insert(Clip::video(id, duration)).unwrap();
                    }
                    Op::Remove(index) => {
                        if let Some((id, _, _)) = program_id(&timeline, index) {
                            timeline.remove(&id).unwrap();
                        }
                    }
                    Op::Split(index, ratio) => {
                        if let Some((id, start, duration)) = program_id(&timeline, index) {
                            // cuts too close to an edge are rejected without changes
                            let _ = timeline.split(&id, start + duration * ratio);
                        }
                    }
                    Op::Reorder(index, center) => {
                        if let Some((id, _, _)) = program_id(&timeline, index) {
                            timeline.reorder_program(&id, center).unwrap();
                        }
                    }
                }

                let clips = timeline.lane(LaneKind::Program).clips();
                if let Some(first) = clips.first() {
                    prop_assert_eq!(first.start, 0.0);
                }
                for pair in clips.windows(2) {
                    prop_assert!((pair[0].end() - pair[1].start).abs() < 1e-9);
                }
                let summed: f64 = clips.iter().map(|clip| clip.duration).sum();
                prop_assert!((timeline.total_duration() - summed).abs() < 1e-6);
                prop_assert!((timeline.program_span() - summed).abs() < 1e-9);
            }
        }
    }
}
