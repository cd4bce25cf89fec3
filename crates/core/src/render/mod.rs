use serde::{Deserialize, Serialize};

use crate::{
    clip::{ClipPayload, LaneKind},
    config::{CaptionPlacement, CaptionStyle},
    timeline::Timeline,
};

/// Simplified clip description consumed by the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub asset_id: Option<String>,
    pub label: String,
    pub start: f64,
    pub duration: f64,
    pub volume: Option<f32>,
    pub speed: Option<f32>,
    pub source_in: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedLane {
    pub lane: LaneKind,
    pub items: Vec<FeedItem>,
}

/// Caption text positioned and styled for the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub clip_id: String,
    pub text: String,
    pub start: f64,
    pub duration: f64,
    /// Vertical anchor as a fraction of stage height.
    pub anchor_y: f32,
    pub font_family: String,
    pub font_size: f32,
    pub color: String,
    pub opacity: f32,
}

/// Projection of the timeline handed to the compositor after each
/// structural change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositorFeed {
    pub lanes: Vec<FeedLane>,
    pub text_layers: Vec<TextLayer>,
    pub duration: f64,
}

impl CompositorFeed {
    pub fn build(timeline: &Timeline, style: &CaptionStyle) -> Self {
        let lanes = timeline
            .lanes()
            .map(|lane| FeedLane {
                lane: lane.kind(),
                items: lane
                    .clips()
                    .iter()
                    .map(|clip| FeedItem {
                        id: clip.id.clone(),
                        asset_id: clip.asset_id.clone(),
                        label: clip.label.clone(),
                        start: clip.start,
                        duration: clip.duration,
                        volume: clip.volume(),
                        speed: clip.speed(),
                        source_in: clip.source_in,
                    })
                    .collect(),
            })
            .collect();

        Self {
            lanes,
            text_layers: text_layers(timeline, style),
            duration: timeline.total_duration(),
        }
    }

    pub fn lane(&self, kind: LaneKind) -> Option<&FeedLane> {
        self.lanes.iter().find(|lane| lane.lane == kind)
    }
}

/// Derives caption text layers. Nothing is produced while the styling
/// intensity is at or below its minimum.
pub fn text_layers(timeline: &Timeline, style: &CaptionStyle) -> Vec<TextLayer> {
    if style.intensity <= style.min_intensity {
        return Vec::new();
    }

    let anchor_y = match style.placement {
        CaptionPlacement::Top => 0.1,
        CaptionPlacement::Center => 0.5,
        CaptionPlacement::Bottom => 0.88,
    };
    let opacity = style.intensity.clamp(0.0, 1.0);

    timeline
        .lane(LaneKind::OverlayCaption)
        .clips()
        .iter()
        .filter_map(|clip| match &clip.payload {
            ClipPayload::Caption { text, .. } if !text.trim().is_empty() => Some(TextLayer {
                clip_id: clip.id.clone(),
                text: text.clone(),
                start: clip.start,
                duration: clip.duration,
                anchor_y,
                font_family: style.font_family.clone(),
                font_size: style.font_size,
                color: style.color.clone(),
                opacity,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;

    fn timeline() -> Timeline {
        let mut timeline = Timeline::new(30.0);
        timeline
            .insert(Clip::video("v", 4.0).with_asset("movie").with_source(1.0, Some(9.0)))
            .unwrap();
        timeline.insert(Clip::caption("c", 2.0, "hello").at(1.0)).unwrap();
        timeline.insert(Clip::caption("blank", 2.0, "  ").at(3.0)).unwrap();
        timeline
    }

    #[test]
    fn projects_every_lane() {
        let feed = CompositorFeed::build(&timeline(), &CaptionStyle::default());
        let program = feed.lane(LaneKind::Program).unwrap();
        assert_eq!(program.items[0].asset_id.as_deref(), Some("movie"));
        assert_eq!(program.items[0].source_in, 1.0);
        assert_eq!(program.items[0].volume, Some(1.0));
        assert_eq!(feed.duration, 5.0);
    }

    #[test]
    fn captions_become_styled_text_layers() {
        let style = CaptionStyle {
            placement: CaptionPlacement::Top,
            intensity: 0.5,
            ..CaptionStyle::default()
        };
        let layers = text_layers(&timeline(), &style);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].text, "hello");
        assert_eq!(layers[0].anchor_y, 0.1);
        assert_eq!(layers[0].opacity, 0.5);
    }

    #[test]
    fn faint_styles_skip_text_layers() {
        let style = CaptionStyle {
            intensity: 0.05,
            ..CaptionStyle::default()
        };
        assert!(text_layers(&timeline(), &style).is_empty());
    }
}
