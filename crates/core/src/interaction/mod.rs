//! Pointer-driven drag and resize of individual clips.
//!
//! Interactive elements never look up shared state on their own. Pointer
//! capture, the scrolling viewport and the per-frame scheduling token all live
//! in an [`InteractionContext`] handed to every call, which keeps the state
//! machine usable without a rendering surface.

use crate::{
    clip::{Clip, ClipId, ClipPayload, LaneKind},
    config::InteractionConfig,
    coords::{frame_duration, quantize, CoordinateModel},
};

/// Part of a clip that received the pointer press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    Body,
    LeftEdge,
    RightEdge,
}

/// Classifies a press at `local_x` pixels from the clip's left edge. Narrow
/// clips shrink their handles so the body stays grabbable.
pub fn hit_zone(local_x: f64, width: f64, handle: f64) -> HitZone {
    let handle = handle.min(width / 3.0).max(0.0);
    if local_x <= handle {
        HitZone::LeftEdge
    } else if local_x >= width - handle {
        HitZone::RightEdge
    } else {
        HitZone::Body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Idle,
    Dragging,
    ResizingLeft,
    ResizingRight,
}

impl From<HitZone> for InteractionMode {
    fn from(zone: HitZone) -> Self {
        match zone {
            HitZone::Body => InteractionMode::Dragging,
            HitZone::LeftEdge => InteractionMode::ResizingLeft,
            HitZone::RightEdge => InteractionMode::ResizingRight,
        }
    }
}

impl InteractionMode {
    pub fn is_resize(self) -> bool {
        matches!(
            self,
            InteractionMode::ResizingLeft | InteractionMode::ResizingRight
        )
    }
}

/// Live geometry of a clip under interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipGeometry {
    pub start: f64,
    pub duration: f64,
    pub source_in: f64,
}

impl ClipGeometry {
    pub fn of(clip: &Clip) -> Self {
        Self {
            start: clip.start,
            duration: clip.duration,
            source_in: clip.source_in,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn center(&self) -> f64 {
        self.start + self.duration * 0.5
    }
}

/// Constraints applied to candidate geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditLimits {
    pub fps: f64,
    /// Current end of the whole timeline.
    pub timeline_duration: f64,
    /// Extra room past the end a clip may be dragged into.
    pub overflow: f64,
    pub min_duration: f64,
    /// Total length of the referenced media, when known.
    pub source_duration: Option<f64>,
    /// Media clips cannot read before the start of their source.
    pub media: bool,
}

impl EditLimits {
    pub fn for_clip(
        clip: &Clip,
        fps: f64,
        timeline_duration: f64,
        config: &InteractionConfig,
    ) -> Self {
        let frame = frame_duration(fps);
        let min_duration = config
            .min_clip_seconds
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(frame)
            .max(frame);
        Self {
            fps,
            timeline_duration,
            overflow: config.drag_overflow_seconds.max(0.0),
            min_duration,
            source_duration: clip.source_duration,
            media: matches!(
                clip.payload,
                ClipPayload::Video { .. } | ClipPayload::Audio { .. }
            ),
        }
    }

    /// Latest end time any edit may reach.
    pub fn ceiling(&self) -> f64 {
        self.timeline_duration + self.overflow
    }
}

/// Moves the whole clip by `delta` seconds.
pub fn compute_drag(origin: ClipGeometry, delta: f64, limits: &EditLimits) -> ClipGeometry {
    let latest = (limits.ceiling() - origin.duration).max(0.0);
    let start = quantize(origin.start + delta, limits.fps).clamp(0.0, latest);
    ClipGeometry { start, ..origin }
}

/// Moves the right edge by `delta` seconds.
pub fn compute_resize_right(origin: ClipGeometry, delta: f64, limits: &EditLimits) -> ClipGeometry {
    let mut longest = limits.ceiling() - origin.start;
    if let Some(total) = limits.source_duration {
        longest = longest.min(total - origin.source_in);
    }
    let longest = longest.max(limits.min_duration);
    let duration = quantize(origin.duration + delta, limits.fps).clamp(limits.min_duration, longest);
    ClipGeometry { duration, ..origin }
}

/// Moves the left edge by `delta` seconds while the right edge stays put.
/// The source offset slides with the edge.
pub fn compute_resize_left(origin: ClipGeometry, delta: f64, limits: &EditLimits) -> ClipGeometry {
    let end = origin.end();
    let mut earliest: f64 = 0.0;
    if limits.media {
        earliest = earliest.max(origin.start - origin.source_in);
    }
    let latest = end - limits.min_duration;
    let earliest = earliest.min(latest);
    let start = quantize(origin.start + delta, limits.fps).clamp(earliest, latest);
    ClipGeometry {
        start,
        duration: end - start,
        source_in: (origin.source_in + (start - origin.start)).max(0.0),
    }
}

/// Auto-scroll speed for a pointer at `client_x`. Negative scrolls left.
/// Grows linearly with how far the pointer has entered the edge band.
pub fn auto_scroll_velocity(client_x: f64, viewport: &Viewport, edge: f64, max_speed: f64) -> f64 {
    if edge <= 0.0 || viewport.width <= 0.0 {
        return 0.0;
    }
    let local = client_x - viewport.left;
    let right_band = viewport.width - edge;
    if local < edge {
        -max_speed * ((edge - local) / edge).min(1.0)
    } else if local > right_band {
        max_speed * ((local - right_band) / edge).min(1.0)
    } else {
        0.0
    }
}

/// Scrollable window onto the timeline content, in client pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl Viewport {
    pub fn to_content_x(&self, client_x: f64) -> f64 {
        client_x - self.left + self.scroll_left
    }

    pub fn to_content_y(&self, client_y: f64) -> f64 {
        client_y - self.top + self.scroll_top
    }

    /// Scrolls horizontally within `[0, content_width - width]`.
    pub fn scroll_by(&mut self, dx: f64, content_width: f64) -> f64 {
        let limit = (content_width - self.width).max(0.0);
        let before = self.scroll_left;
        self.scroll_left = (self.scroll_left + dx).clamp(0.0, limit.max(before));
        self.scroll_left - before
    }
}

/// Coalesces pointer updates to at most one application per display frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameToken {
    scheduled: bool,
}

impl FrameToken {
    /// Returns `true` when the caller must schedule a new animation frame.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.scheduled, true)
    }

    /// Consumes the token; `false` when no update was requested.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.scheduled)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}

/// Shared interaction state handed to every interactive clip.
#[derive(Debug, Clone)]
pub struct InteractionContext {
    pub viewport: Viewport,
    pub config: InteractionConfig,
    capture: Option<ClipId>,
    frame: FrameToken,
}

impl InteractionContext {
    pub fn new(config: InteractionConfig, viewport: Viewport) -> Self {
        Self {
            viewport,
            config,
            capture: None,
            frame: FrameToken::default(),
        }
    }

    /// Routes subsequent pointer events to `id`. Fails while another clip
    /// holds the capture.
    pub fn capture(&mut self, id: &str) -> bool {
        match &self.capture {
            Some(owner) if owner != id => false,
            _ => {
                self.capture = Some(id.to_string());
                true
            }
        }
    }

    pub fn release_capture(&mut self, id: &str) {
        if self.capture.as_deref() == Some(id) {
            self.capture = None;
        }
    }

    pub fn captured(&self) -> Option<&str> {
        self.capture.as_deref()
    }

    pub fn frame_token(&mut self) -> &mut FrameToken {
        &mut self.frame
    }
}

/// Result of applying one display frame's worth of pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    pub geometry: ClipGeometry,
    /// The pointer sits in an edge band; another frame should follow.
    pub scrolling: bool,
}

/// Outcome of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum Release {
    /// Geometry should be written back into the store.
    Commit {
        id: ClipId,
        lane: LaneKind,
        mode: InteractionMode,
        geometry: ClipGeometry,
    },
    /// The pointer barely moved: treat as a selection click.
    Click { id: ClipId, lane: LaneKind },
}

/// Per-clip drag/resize state machine.
#[derive(Debug, Clone)]
pub struct ClipInteraction {
    id: ClipId,
    lane: LaneKind,
    mode: InteractionMode,
    origin: ClipGeometry,
    live: ClipGeometry,
    limits: EditLimits,
    press_content_x: f64,
    pointer_client_x: f64,
    travelled: f64,
}

impl ClipInteraction {
    /// Starts an interaction on `clip`. Returns `None` when another clip
    /// holds the pointer capture.
    pub fn begin(
        clip: &Clip,
        zone: HitZone,
        client_x: f64,
        limits: EditLimits,
        ctx: &mut InteractionContext,
    ) -> Option<Self> {
        if !ctx.capture(&clip.id) {
            return None;
        }
        let origin = ClipGeometry::of(clip);
        Some(Self {
            id: clip.id.clone(),
            lane: clip.lane(),
            mode: zone.into(),
            origin,
            live: origin,
            limits,
            press_content_x: ctx.viewport.to_content_x(client_x),
            pointer_client_x: client_x,
            travelled: 0.0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn lane(&self) -> LaneKind {
        self.lane
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn origin(&self) -> ClipGeometry {
        self.origin
    }

    pub fn live(&self) -> ClipGeometry {
        self.live
    }

    /// Records the latest pointer position. Returns `true` when the caller
    /// has to schedule an animation frame to apply it.
    pub fn pointer_move(&mut self, client_x: f64, ctx: &mut InteractionContext) -> bool {
        self.pointer_client_x = client_x;
        ctx.frame_token().request()
    }

    /// Applies the coalesced pointer input, auto-scrolling first when the
    /// pointer sits near a viewport edge.
    pub fn on_frame(
        &mut self,
        ctx: &mut InteractionContext,
        coords: &CoordinateModel,
    ) -> Option<FrameUpdate> {
        if !ctx.frame_token().take() {
            return None;
        }

        let velocity = auto_scroll_velocity(
            self.pointer_client_x,
            &ctx.viewport,
            ctx.config.auto_scroll_edge_pixels,
            ctx.config.auto_scroll_max_speed,
        );
        let content_width = coords.to_pixels(self.limits.ceiling());
        let scrolled = ctx.viewport.scroll_by(velocity, content_width);

        self.live = self.candidate(ctx, coords);
        let scrolling = scrolled != 0.0;
        if scrolling {
            ctx.frame_token().request();
        }
        Some(FrameUpdate {
            geometry: self.live,
            scrolling,
        })
    }

    fn candidate(&mut self, ctx: &InteractionContext, coords: &CoordinateModel) -> ClipGeometry {
        let displacement = ctx.viewport.to_content_x(self.pointer_client_x) - self.press_content_x;
        self.travelled = self.travelled.max(displacement.abs());
        let delta = coords.to_seconds(displacement);
        match self.mode {
            InteractionMode::Dragging => compute_drag(self.origin, delta, &self.limits),
            InteractionMode::ResizingLeft => compute_resize_left(self.origin, delta, &self.limits),
            InteractionMode::ResizingRight => {
                compute_resize_right(self.origin, delta, &self.limits)
            }
            InteractionMode::Idle => self.origin,
        }
    }

    /// Ends the interaction at `client_x`. Any pending frame is flushed so the
    /// committed geometry reflects the final pointer position.
    pub fn release(
        mut self,
        client_x: f64,
        ctx: &mut InteractionContext,
        coords: &CoordinateModel,
    ) -> Release {
        self.pointer_client_x = client_x;
        ctx.frame_token().take();
        self.live = self.candidate(ctx, coords);
        ctx.release_capture(&self.id);

        if self.mode.is_resize() || self.travelled > ctx.config.slop_pixels {
            tracing::debug!(id = %self.id, mode = ?self.mode, start = self.live.start, duration = self.live.duration, "committing clip edit");
            Release::Commit {
                id: self.id,
                lane: self.lane,
                mode: self.mode,
                geometry: self.live,
            }
        } else {
            Release::Click {
                id: self.id,
                lane: self.lane,
            }
        }
    }

    /// Abandons the interaction and returns the untouched geometry.
    pub fn cancel(self, ctx: &mut InteractionContext) -> ClipGeometry {
        ctx.frame_token().take();
        ctx.release_capture(&self.id);
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoomConfig;

    fn limits() -> EditLimits {
        EditLimits {
            fps: 30.0,
            timeline_duration: 12.0,
            overflow: 10.0,
            min_duration: 1.0 / 30.0,
            source_duration: None,
            media: true,
        }
    }

    fn geometry(start: f64, duration: f64, source_in: f64) -> ClipGeometry {
        ClipGeometry {
            start,
            duration,
            source_in,
        }
    }

    fn setup() -> (InteractionContext, CoordinateModel) {
        let viewport = Viewport {
            left: 0.0,
            width: 800.0,
            height: 200.0,
            ..Default::default()
        };
        let ctx = InteractionContext::new(InteractionConfig::default(), viewport);
        let mut coords = CoordinateModel::new(ZoomConfig::default(), 30.0, 800.0);
        coords.set_zoom(100.0);
        (ctx, coords)
    }

    #[test]
    fn classifies_edges_and_body() {
        assert_eq!(hit_zone(2.0, 100.0, 8.0), HitZone::LeftEdge);
        assert_eq!(hit_zone(50.0, 100.0, 8.0), HitZone::Body);
        assert_eq!(hit_zone(95.0, 100.0, 8.0), HitZone::RightEdge);
        // 12px clip: handles shrink to 4px each
        assert_eq!(hit_zone(6.0, 12.0, 8.0), HitZone::Body);
    }

    #[test]
    fn right_resize_quantizes_to_frames() {
        let next = compute_resize_right(geometry(0.0, 5.0, 0.0), 0.02, &limits());
        assert!((next.duration - 151.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn right_resize_respects_source_length() {
        let limits = EditLimits {
            source_duration: Some(6.0),
            ..limits()
        };
        let next = compute_resize_right(geometry(0.0, 5.0, 0.5), 4.0, &limits);
        assert_eq!(next.duration, 5.5);
    }

    #[test]
    fn resize_never_goes_below_one_frame() {
        let next = compute_resize_right(geometry(1.0, 2.0, 0.0), -10.0, &limits());
        assert!((next.duration - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn left_resize_keeps_right_edge_and_slides_source() {
        let next = compute_resize_left(geometry(2.0, 4.0, 1.0), 1.0, &limits());
        assert_eq!(next.start, 3.0);
        assert_eq!(next.duration, 3.0);
        assert_eq!(next.source_in, 2.0);
        assert_eq!(next.end(), 6.0);

        // cannot reveal media before the source start
        let next = compute_resize_left(geometry(2.0, 4.0, 1.0), -5.0, &limits());
        assert_eq!(next.start, 1.0);
        assert_eq!(next.source_in, 0.0);
    }

    #[test]
    fn left_resize_of_text_clips_only_stops_at_zero() {
        let limits = EditLimits {
            media: false,
            ..limits()
        };
        let next = compute_resize_left(geometry(2.0, 1.0, 0.0), -5.0, &limits);
        assert_eq!(next.start, 0.0);
        assert_eq!(next.duration, 3.0);
    }

    #[test]
    fn drag_is_clamped_to_timeline_window() {
        let origin = geometry(2.0, 4.0, 0.0);
        assert_eq!(compute_drag(origin, -10.0, &limits()).start, 0.0);
        assert_eq!(compute_drag(origin, 100.0, &limits()).start, 18.0);
    }

    #[test]
    fn auto_scroll_scales_with_penetration() {
        let viewport = Viewport {
            width: 800.0,
            ..Default::default()
        };
        assert_eq!(auto_scroll_velocity(400.0, &viewport, 40.0, 20.0), 0.0);
        assert_eq!(auto_scroll_velocity(780.0, &viewport, 40.0, 20.0), 10.0);
        assert_eq!(auto_scroll_velocity(0.0, &viewport, 40.0, 20.0), -20.0);
        assert_eq!(auto_scroll_velocity(900.0, &viewport, 40.0, 20.0), 20.0);
    }

    #[test]
    fn moves_coalesce_into_one_frame() {
        let (mut ctx, coords) = setup();
        let clip = Clip::audio("a", 2.0).at(1.0);
        let limits = EditLimits::for_clip(&clip, 30.0, 12.0, &ctx.config);
        let mut interaction =
            ClipInteraction::begin(&clip, HitZone::Body, 150.0, limits, &mut ctx).unwrap();

        assert!(interaction.pointer_move(160.0, &mut ctx));
        assert!(!interaction.pointer_move(170.0, &mut ctx));
        assert!(!interaction.pointer_move(200.0, &mut ctx));

        let update = interaction.on_frame(&mut ctx, &coords).unwrap();
        assert!((update.geometry.start - 1.5).abs() < 1e-9);
        assert!(!update.scrolling);
        assert!(interaction.on_frame(&mut ctx, &coords).is_none());
    }

    #[test]
    fn small_moves_release_as_clicks() {
        let (mut ctx, coords) = setup();
        let clip = Clip::audio("a", 2.0).at(1.0);
        let limits = EditLimits::for_clip(&clip, 30.0, 12.0, &ctx.config);
        let mut interaction =
            ClipInteraction::begin(&clip, HitZone::Body, 150.0, limits, &mut ctx).unwrap();
        interaction.pointer_move(151.0, &mut ctx);

        let release = interaction.release(152.0, &mut ctx, &coords);
        assert!(matches!(release, Release::Click { .. }));
        assert_eq!(ctx.captured(), None);
    }

    #[test]
    fn resizes_always_commit() {
        let (mut ctx, coords) = setup();
        let clip = Clip::audio("a", 2.0).at(1.0);
        let limits = EditLimits::for_clip(&clip, 30.0, 12.0, &ctx.config);
        let interaction =
            ClipInteraction::begin(&clip, HitZone::RightEdge, 300.0, limits, &mut ctx).unwrap();
        let release = interaction.release(300.0, &mut ctx, &coords);
        assert!(matches!(
            release,
            Release::Commit {
                mode: InteractionMode::ResizingRight,
                ..
            }
        ));
    }

    #[test]
    fn capture_is_exclusive() {
        let (mut ctx, _) = setup();
        let first = Clip::audio("a", 2.0);
        let second = Clip::audio("b", 2.0);
        let limits = EditLimits::for_clip(&first, 30.0, 12.0, &ctx.config);
        let active = ClipInteraction::begin(&first, HitZone::Body, 10.0, limits, &mut ctx).unwrap();
        assert!(ClipInteraction::begin(&second, HitZone::Body, 10.0, limits, &mut ctx).is_none());

        let original = active.cancel(&mut ctx);
        assert_eq!(original.start, 0.0);
        assert!(ClipInteraction::begin(&second, HitZone::Body, 10.0, limits, &mut ctx).is_some());
    }

    #[test]
    fn edge_band_scrolls_and_extends_the_drag() {
        let (mut ctx, coords) = setup();
        let clip = Clip::audio("a", 2.0).at(1.0);
        let limits = EditLimits::for_clip(&clip, 30.0, 12.0, &ctx.config);
        let mut interaction =
            ClipInteraction::begin(&clip, HitZone::Body, 150.0, limits, &mut ctx).unwrap();

        interaction.pointer_move(790.0, &mut ctx);
        let first = interaction.on_frame(&mut ctx, &coords).unwrap();
        assert!(first.scrolling);
        assert!(ctx.viewport.scroll_left > 0.0);
        // the scroll keeps a frame scheduled without further pointer input
        let second = interaction.on_frame(&mut ctx, &coords).unwrap();
        assert!(second.geometry.start > first.geometry.start);
    }
}
