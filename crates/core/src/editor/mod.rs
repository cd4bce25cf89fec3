//! Editor façade tying the clip store to pointer input, selection,
//! persistence and the compositor.

use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::{
    assets::{AssetCaches, BufferReleaser, PreviewBuffers, TracingReleaser},
    clip::{ClipId, LaneKind},
    config::EditorConfig,
    coords::CoordinateModel,
    edit::SplitOutcome,
    ingest::{Cue, DropPayload},
    interaction::{
        hit_zone, ClipGeometry, ClipInteraction, EditLimits, FrameUpdate, InteractionContext,
        InteractionMode, Release, Viewport,
    },
    packing::{PackingCache, RowPacking},
    render::CompositorFeed,
    selection::{ClipBox, Marquee, Selection},
    sync::{PersistenceSync, SaveStatus, TimelineStore},
    timeline::Timeline,
    wire::from_wire,
    Result,
};

/// What the pointer went down on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    Clip(ClipId),
    EmptyCanvas,
}

/// Single-project timeline editor.
pub struct TimelineEditor {
    config: EditorConfig,
    timeline: Timeline,
    coords: CoordinateModel,
    ctx: InteractionContext,
    active: Option<ClipInteraction>,
    marquee: Option<Marquee>,
    selection: Selection,
    packing: PackingCache,
    sync: PersistenceSync,
    assets: AssetCaches,
    buffers: PreviewBuffers,
    releaser: Box<dyn BufferReleaser>,
    playhead: f64,
    pending_feed: Option<CompositorFeed>,
}

impl fmt::Debug for TimelineEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineEditor")
            .field("project", &self.sync.project_id())
            .field("clips", &self.timeline.clip_count())
            .field("revision", &self.timeline.revision())
            .field("selection", &self.selection)
            .field("buffers", &self.buffers.len())
            .finish_non_exhaustive()
    }
}

impl TimelineEditor {
    /// Opens `timeline` without touching a store.
    pub fn new(
        project_id: impl Into<String>,
        timeline: Timeline,
        config: EditorConfig,
        viewport: Viewport,
    ) -> Self {
        let coords = CoordinateModel::new(config.zoom.clone(), timeline.fps(), viewport.width);
        let ctx = InteractionContext::new(config.interaction.clone(), viewport);
        let debounce = Duration::from_millis(config.persistence.debounce_ms);
        let mut editor = Self {
            timeline,
            coords,
            ctx,
            active: None,
            marquee: None,
            selection: Selection::new(),
            packing: PackingCache::new(),
            sync: PersistenceSync::new(project_id, debounce),
            assets: AssetCaches::new(),
            buffers: PreviewBuffers::new(),
            releaser: Box::new(TracingReleaser),
            playhead: 0.0,
            pending_feed: None,
            config,
        };
        editor.refresh();
        editor
    }

    /// Fetches the project from `store`. A failed fetch opens an empty
    /// timeline at the configured frame rate.
    pub fn load<S: TimelineStore + ?Sized>(
        project_id: impl Into<String>,
        store: &mut S,
        config: EditorConfig,
        viewport: Viewport,
    ) -> Self {
        let project_id = project_id.into();
        let timeline = match store.fetch(&project_id) {
            Ok(wire) => from_wire(wire, config.default_fps),
            Err(err) => {
                tracing::warn!(project = %project_id, %err, "timeline fetch failed, starting empty");
                Timeline::new(config.default_fps)
            }
        };
        tracing::info!(
            project = %project_id,
            clips = timeline.clip_count(),
            revision = timeline.revision(),
            "timeline loaded"
        );
        Self::new(project_id, timeline, config, viewport)
    }

    /// Routes preview buffer releases to the host.
    pub fn with_releaser(mut self, releaser: impl BufferReleaser + 'static) -> Self {
        self.releaser = Box::new(releaser);
        self
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn coords(&self) -> &CoordinateModel {
        &self.coords
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.ctx.viewport
    }

    pub fn sync(&self) -> &PersistenceSync {
        &self.sync
    }

    pub fn assets(&self) -> &AssetCaches {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetCaches {
        &mut self.assets
    }

    pub fn buffers_mut(&mut self) -> &mut PreviewBuffers {
        &mut self.buffers
    }

    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    pub fn set_playhead(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.playhead = self.coords.quantize(seconds.max(0.0));
        }
    }

    /// Geometry to draw for `id`, including an in-progress interaction.
    pub fn display_geometry(&self, id: &str) -> Option<ClipGeometry> {
        match &self.active {
            Some(active) if active.id() == id => Some(active.live()),
            _ => self.timeline.find(id).map(ClipGeometry::of),
        }
    }

    pub fn is_interacting(&self) -> bool {
        self.active.is_some()
    }

    /// Row layout of an overlay lane.
    pub fn rows(&mut self, kind: LaneKind) -> &RowPacking {
        self.timeline.rows(kind, &mut self.packing)
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.coords.set_zoom(zoom)
    }

    /// Zooms by `factor` around a viewport x coordinate.
    pub fn zoom_about(&mut self, factor: f64, anchor_x: f64) -> f64 {
        let scroll = self
            .coords
            .zoom_about(factor, anchor_x, self.ctx.viewport.scroll_left);
        self.ctx.viewport.scroll_left = scroll;
        self.coords.zoom()
    }

    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        self.ctx.viewport.width = width;
        self.ctx.viewport.height = height;
        self.coords.set_viewport_width(width);
    }

    pub fn scroll_to(&mut self, scroll_left: f64, scroll_top: f64) {
        self.ctx.viewport.scroll_left = scroll_left.max(0.0);
        self.ctx.viewport.scroll_top = scroll_top.max(0.0);
    }

    /// Timeline time under a client x coordinate.
    pub fn time_at(&self, client_x: f64) -> f64 {
        let content_x = self.ctx.viewport.to_content_x(client_x);
        self.coords.quantize(self.coords.to_seconds(content_x).max(0.0))
    }

    /// Handles a pointer press. `additive` is the multi-select modifier.
    /// Returns `true` when the press started a drag, resize or marquee.
    pub fn pointer_down(
        &mut self,
        target: HitTarget,
        client_x: f64,
        client_y: f64,
        additive: bool,
    ) -> bool {
        if self.active.is_some() || self.marquee.is_some() {
            return false;
        }
        match target {
            HitTarget::Clip(id) => {
                let Some(clip) = self.timeline.find(&id) else {
                    return false;
                };
                if additive {
                    self.selection.toggle(clip.lane(), &id);
                    return false;
                }
                self.selection.select_only(clip.lane(), &id);
                let local_x =
                    self.ctx.viewport.to_content_x(client_x) - self.coords.to_pixels(clip.start);
                let width = self.coords.to_pixels(clip.duration);
                let zone = hit_zone(local_x, width, self.ctx.config.edge_handle_pixels);
                let limits = EditLimits::for_clip(
                    clip,
                    self.timeline.fps(),
                    self.timeline.total_duration(),
                    &self.ctx.config,
                );
                self.active = ClipInteraction::begin(clip, zone, client_x, limits, &mut self.ctx);
                self.active.is_some()
            }
            HitTarget::EmptyCanvas => {
                let origin = (
                    self.ctx.viewport.to_content_x(client_x),
                    self.ctx.viewport.to_content_y(client_y),
                );
                self.marquee = Some(Marquee::begin(origin, additive, &self.selection));
                true
            }
        }
    }

    /// Handles pointer movement. `boxes` are the rendered clip rectangles
    /// used for marquee hit testing. Returns `true` when an animation frame
    /// has to be scheduled.
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64, boxes: &[ClipBox]) -> bool {
        if let Some(active) = &mut self.active {
            return active.pointer_move(client_x, &mut self.ctx);
        }
        if let Some(marquee) = &mut self.marquee {
            let point = (
                self.ctx.viewport.to_content_x(client_x),
                self.ctx.viewport.to_content_y(client_y),
            );
            marquee.update(point, self.ctx.config.slop_pixels);
            marquee.apply(&mut self.selection, boxes, &self.ctx.viewport, None);
        }
        false
    }

    /// Applies coalesced pointer input for the current display frame.
    pub fn animation_frame(&mut self) -> Option<FrameUpdate> {
        let active = self.active.as_mut()?;
        active.on_frame(&mut self.ctx, &self.coords)
    }

    /// Handles the pointer release, committing edits or resolving clicks.
    pub fn pointer_up(&mut self, client_x: f64, now: Instant) -> Result<Option<Release>> {
        if let Some(marquee) = self.marquee.take() {
            marquee.finish(&mut self.selection);
            return Ok(None);
        }
        let Some(active) = self.active.take() else {
            return Ok(None);
        };

        let release = active.release(client_x, &mut self.ctx, &self.coords);
        match &release {
            Release::Commit {
                id,
                lane,
                mode,
                geometry,
            } => {
                if lane.is_program() && *mode == InteractionMode::Dragging {
                    self.timeline.reorder_program(id, geometry.center())?;
                } else {
                    self.timeline
                        .set_geometry(id, geometry.start, geometry.duration, geometry.source_in)?;
                }
                self.structural_change(now);
            }
            Release::Click { id, lane } => self.selection.select_only(*lane, id),
        }
        Ok(Some(release))
    }

    /// Abandons any drag, resize or marquee in progress.
    pub fn cancel_interaction(&mut self) {
        if let Some(active) = self.active.take() {
            let original = active.cancel(&mut self.ctx);
            tracing::debug!(start = original.start, "interaction cancelled");
        }
        self.marquee = None;
    }

    /// Splits the selected clips under the playhead, or the program clip
    /// under it when nothing is selected. Clips not spanning the playhead,
    /// or whose edges sit within a frame of it, are left alone.
    pub fn split_at_playhead(&mut self, now: Instant) -> Vec<SplitOutcome> {
        let at = self.playhead;
        let spans = |start: f64, end: f64| start < at && at < end;
        let targets: Vec<ClipId> = if self.selection.is_empty() {
            self.timeline
                .lane(LaneKind::Program)
                .clips()
                .iter()
                .filter(|clip| spans(clip.start, clip.end()))
                .map(|clip| clip.id.clone())
                .collect()
        } else {
            self.selection
                .ids()
                .filter_map(|id| self.timeline.find(id))
                .filter(|clip| spans(clip.start, clip.end()))
                .map(|clip| clip.id.clone())
                .collect()
        };

        let mut outcomes = Vec::with_capacity(targets.len());
        for id in targets {
            match self.timeline.split(&id, at) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => tracing::debug!(%id, %err, "skipping split target"),
            }
        }
        if !outcomes.is_empty() {
            self.structural_change(now);
        }
        outcomes
    }

    /// Deletes every selected clip.
    pub fn delete_selection(&mut self, now: Instant) -> usize {
        let ids: Vec<ClipId> = self.selection.ids().map(str::to_string).collect();
        let removed = self.timeline.delete_many(ids.iter().map(String::as_str));
        self.selection.clear();
        if !removed.is_empty() {
            self.structural_change(now);
        }
        removed.len()
    }

    /// Places a dropped asset at the time under `client_x`.
    pub fn drop_asset(&mut self, payload: DropPayload, client_x: f64, now: Instant) -> Option<ClipId> {
        let at = self.time_at(client_x);
        let id = self.timeline.drop_asset(payload, at)?;
        self.structural_change(now);
        Some(id)
    }

    pub fn insert_cues(&mut self, cues: &[Cue], now: Instant) -> Vec<ClipId> {
        let ids = self.timeline.insert_cues(cues);
        if !ids.is_empty() {
            self.structural_change(now);
        }
        ids
    }

    /// Runs any edit against the store and treats it as a structural change.
    /// A failing edit leaves the timeline untouched.
    pub fn edit<T, F>(&mut self, now: Instant, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Timeline) -> Result<T>,
    {
        let mut staged = self.timeline.clone();
        let value = apply(&mut staged)?;
        self.timeline = staged;
        self.structural_change(now);
        Ok(value)
    }

    /// Keys of thumbnails and waveforms that still need fetching.
    pub fn pending_asset_requests(&mut self) -> (Vec<String>, Vec<String>) {
        let mut thumbnails = Vec::new();
        let mut waveforms = Vec::new();
        for clip in self.timeline.clips() {
            let (thumbnail, waveform) = self.assets.requests_for(clip);
            thumbnails.extend(thumbnail);
            waveforms.extend(waveform);
        }
        (thumbnails, waveforms)
    }

    /// Compositor feed produced by the last structural change, if any.
    pub fn take_feed(&mut self) -> Option<CompositorFeed> {
        self.pending_feed.take()
    }

    /// Runs a save cycle if one is due.
    pub fn tick<S: TimelineStore + ?Sized>(
        &mut self,
        now: Instant,
        store: &mut S,
    ) -> Option<SaveStatus> {
        self.sync.tick(now, &mut self.timeline, store)
    }

    pub fn flush<S: TimelineStore + ?Sized>(
        &mut self,
        now: Instant,
        store: &mut S,
    ) -> Option<SaveStatus> {
        self.sync.flush(now, &mut self.timeline, store)
    }

    /// Cancels any interaction, writes pending edits and releases every
    /// preview buffer.
    pub fn close<S: TimelineStore + ?Sized>(
        mut self,
        now: Instant,
        store: &mut S,
    ) -> Option<SaveStatus> {
        self.cancel_interaction();
        let status = self.flush(now, store);
        let released = self.buffers.release_all(self.releaser.as_mut());
        tracing::debug!(project = %self.sync.project_id(), released, "editor closed");
        status
    }

    fn structural_change(&mut self, now: Instant) {
        self.refresh();
        let timeline = &self.timeline;
        let released = self
            .buffers
            .release_orphans(|id| timeline.contains(id), self.releaser.as_mut());
        if released > 0 {
            tracing::debug!(released, "released buffers of removed clips");
        }
        self.sync.mark_dirty(now);
    }

    fn refresh(&mut self) {
        self.coords.set_fps(self.timeline.fps());
        self.coords
            .set_extent(self.timeline.total_duration(), self.timeline.shortest_clip());
        let pruned = self.selection.retain_existing(&self.timeline);
        if pruned > 0 {
            tracing::debug!(pruned, "pruned stale selection entries");
        }
        self.pending_feed = Some(CompositorFeed::build(&self.timeline, &self.config.captions));
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        clip::Clip,
        selection::Rect,
        sync::MemoryStore,
        wire::WireTimeline,
    };

    #[derive(Clone, Default)]
    struct Released(Rc<RefCell<Vec<String>>>);

    impl Released {
        fn handles(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    impl BufferReleaser for Released {
        fn release(&mut self, handle: &str) {
            self.0.borrow_mut().push(handle.to_string());
        }
    }

    fn viewport() -> Viewport {
        Viewport {
            width: 800.0,
            height: 200.0,
            ..Default::default()
        }
    }

    fn editor() -> TimelineEditor {
        let mut timeline = Timeline::new(30.0);
        timeline.insert(Clip::video("a", 5.0)).unwrap();
        timeline.insert(Clip::video("b", 3.0)).unwrap();
        timeline.insert(Clip::video("c", 4.0)).unwrap();
        let mut editor = TimelineEditor::new("p", timeline, EditorConfig::default(), viewport());
        editor.set_zoom(100.0);
        editor
    }

    fn program_ids(editor: &TimelineEditor) -> Vec<&str> {
        editor
            .timeline()
            .lane(LaneKind::Program)
            .clips()
            .iter()
            .map(|clip| clip.id.as_str())
            .collect()
    }

    #[test]
    fn opening_emits_a_feed() {
        let mut editor = editor();
        let feed = editor.take_feed().unwrap();
        assert_eq!(feed.duration, 12.0);
        assert!(editor.take_feed().is_none());
    }

    #[test]
    fn failed_fetch_opens_an_empty_timeline() {
        let mut store = MemoryStore::new();
        let editor =
            TimelineEditor::load("missing", &mut store, EditorConfig::default(), viewport());
        assert_eq!(editor.timeline().clip_count(), 0);
        assert_eq!(editor.timeline().fps(), 30.0);
    }

    #[test]
    fn dragging_a_program_clip_reorders_the_lane() {
        let mut editor = editor();
        let now = Instant::now();
        assert!(editor.pointer_down(HitTarget::Clip("a".into()), 250.0, 20.0, false));
        assert!(editor.pointer_move(1150.0, 20.0, &[]));
        let release = editor.pointer_up(1150.0, now).unwrap();
        assert!(matches!(release, Some(Release::Commit { .. })));
        assert_eq!(program_ids(&editor), vec!["b", "c", "a"]);
        assert!(editor.sync().is_dirty());
        assert!(editor.take_feed().is_some());
    }

    #[test]
    fn right_edge_resize_repacks_followers() {
        let mut editor = editor();
        assert!(editor.pointer_down(HitTarget::Clip("a".into()), 498.0, 20.0, false));
        editor.pointer_up(500.0, Instant::now()).unwrap();

        let starts: Vec<f64> = editor
            .timeline()
            .lane(LaneKind::Program)
            .clips()
            .iter()
            .map(|clip| clip.start)
            .collect();
        assert!((starts[1] - 151.0 / 30.0).abs() < 1e-9);
        assert!((starts[2] - 241.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn clicks_select_and_modifier_clicks_extend() {
        let mut editor = editor();
        editor.pointer_down(HitTarget::Clip("b".into()), 650.0, 20.0, false);
        let release = editor.pointer_up(651.0, Instant::now()).unwrap();
        assert!(matches!(release, Some(Release::Click { .. })));
        assert_eq!(editor.selection().primary(), Some("b"));

        editor.pointer_down(HitTarget::Clip("c".into()), 0.0, 0.0, true);
        assert_eq!(editor.selection().len(), 2);

        let released = Released::default();
        let mut editor = editor.with_releaser(released.clone());
        editor.buffers_mut().register("c", "blob:c");
        assert_eq!(editor.delete_selection(Instant::now()), 2);
        assert_eq!(program_ids(&editor), vec!["a"]);
        assert_eq!(released.handles(), vec!["blob:c"]);
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn dragging_a_clip_makes_it_the_only_selection() {
        let mut editor = editor();
        editor.pointer_down(HitTarget::Clip("a".into()), 250.0, 20.0, false);
        editor.pointer_up(251.0, Instant::now()).unwrap();
        assert_eq!(editor.selection().ids().collect::<Vec<_>>(), vec!["a"]);

        // "c" spans 800..1200px
        assert!(editor.pointer_down(HitTarget::Clip("c".into()), 1000.0, 20.0, false));
        editor.pointer_move(1050.0, 20.0, &[]);
        let release = editor.pointer_up(1050.0, Instant::now()).unwrap();
        assert!(matches!(release, Some(Release::Commit { .. })));
        assert_eq!(editor.selection().ids().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(editor.selection().primary(), Some("c"));
    }

    #[test]
    fn removals_through_edit_release_buffers() {
        let released = Released::default();
        let mut editor = editor().with_releaser(released.clone());
        let now = Instant::now();
        editor.buffers_mut().register("a", "blob:a");
        editor.buffers_mut().register("c", "blob:c");

        editor.edit(now, |timeline| timeline.remove("a").map(drop)).unwrap();
        assert_eq!(released.handles(), vec!["blob:a"]);

        editor.edit(now, |timeline| timeline.split("c", 5.0)).unwrap();
        editor.buffers_mut().register("c-1", "blob:c-1");
        editor.edit(now, |timeline| timeline.merge("c", "c-1")).unwrap();
        assert_eq!(released.handles(), vec!["blob:a", "blob:c-1"]);
        assert_eq!(editor.buffers_mut().handles("c"), ["blob:c".to_string()]);
    }

    #[test]
    fn failed_edits_leave_the_timeline_untouched() {
        let mut editor = editor();
        let result = editor.edit(Instant::now(), |timeline| {
            timeline.remove("a")?;
            timeline.remove("missing")
        });
        assert!(result.is_err());
        assert_eq!(program_ids(&editor), vec!["a", "b", "c"]);
        assert!(!editor.sync().is_dirty());
    }

    #[test]
    fn marquee_selects_boxes_and_empty_clicks_clear() {
        let mut editor = editor();
        let boxes = vec![
            ClipBox {
                lane: LaneKind::Program,
                id: "a".into(),
                rect: Rect::new(0.0, 0.0, 500.0, 40.0),
            },
            ClipBox {
                lane: LaneKind::Program,
                id: "c".into(),
                rect: Rect::new(800.0, 0.0, 400.0, 40.0),
            },
        ];
        editor.pointer_down(HitTarget::EmptyCanvas, 100.0, 60.0, false);
        editor.pointer_move(300.0, 10.0, &boxes);
        editor.pointer_up(300.0, Instant::now()).unwrap();
        assert_eq!(editor.selection().ids().collect::<Vec<_>>(), vec!["a"]);

        editor.pointer_down(HitTarget::EmptyCanvas, 700.0, 60.0, false);
        editor.pointer_up(700.0, Instant::now()).unwrap();
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn split_at_playhead_cuts_the_program_clip() {
        let mut editor = editor();
        editor.set_playhead(6.0);
        let outcomes = editor.split_at_playhead(Instant::now());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].left, "b");
        assert_eq!(program_ids(&editor), vec!["a", "b", "b-1", "c"]);
        assert_eq!(editor.timeline().total_duration(), 12.0);
    }

    #[test]
    fn near_edge_targets_do_not_block_other_splits() {
        let mut timeline = Timeline::new(30.0);
        timeline.insert(Clip::caption("x", 4.0, "one two three")).unwrap();
        timeline.insert(Clip::caption("y", 2.0, "four five").at(1.01)).unwrap();
        let mut editor = TimelineEditor::new("p", timeline, EditorConfig::default(), viewport());
        editor.take_feed();
        editor.pointer_down(HitTarget::Clip("x".into()), 0.0, 0.0, true);
        editor.pointer_down(HitTarget::Clip("y".into()), 0.0, 0.0, true);
        assert_eq!(editor.selection().len(), 2);

        // y starts less than a frame before the playhead
        editor.set_playhead(31.0 / 30.0);
        let outcomes = editor.split_at_playhead(Instant::now());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].right, "x-1");

        let ids: Vec<_> = editor
            .timeline()
            .lane(LaneKind::OverlayCaption)
            .clips()
            .iter()
            .map(|clip| clip.id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "x-1", "y"]);
        assert!(editor.sync().is_dirty());
        assert!(editor.take_feed().is_some());
    }

    #[test]
    fn cancelled_drags_leave_the_store_alone() {
        let mut editor = editor();
        editor.pointer_down(HitTarget::Clip("a".into()), 250.0, 20.0, false);
        editor.pointer_move(600.0, 20.0, &[]);
        editor.animation_frame();
        editor.cancel_interaction();
        assert!(!editor.is_interacting());
        assert_eq!(program_ids(&editor), vec!["a", "b", "c"]);
        assert!(!editor.sync().is_dirty());
    }

    #[test]
    fn edits_are_saved_after_the_debounce() {
        let wire = WireTimeline {
            tracks: Vec::new(),
            fps: Some(30.0),
            revision: 4,
            duration_seconds: 0.0,
        };
        let mut store = MemoryStore::with_document("p", wire);
        let mut editor =
            TimelineEditor::load("p", &mut store, EditorConfig::default(), viewport());
        let now = Instant::now();
        editor
            .edit(now, |timeline| timeline.insert(Clip::audio("music", 3.0)))
            .unwrap();

        assert!(editor.tick(now, &mut store).is_none());
        let status = editor
            .tick(now + Duration::from_millis(400), &mut store)
            .unwrap();
        assert_eq!(status.revision(), Some(5));
        assert_eq!(editor.timeline().revision(), 5);
        assert!(!editor.sync().is_dirty());
    }
}
