use serde::{Deserialize, Serialize};

/// Opaque clip identity, unique across every lane of a timeline.
pub type ClipId = String;

/// Horizontal lanes of the timeline.
///
/// The program lane is kept gap-free by construction, every other lane is an
/// overlay whose clips may overlap and are spread over display rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaneKind {
    Program,
    OverlayAudio,
    OverlayCaption,
    OverlayImage,
}

impl LaneKind {
    pub const ALL: [LaneKind; 4] = [
        LaneKind::Program,
        LaneKind::OverlayAudio,
        LaneKind::OverlayCaption,
        LaneKind::OverlayImage,
    ];

    pub fn is_program(self) -> bool {
        matches!(self, LaneKind::Program)
    }

    pub fn overlays() -> impl Iterator<Item = LaneKind> {
        Self::ALL.into_iter().filter(|kind| !kind.is_program())
    }
}

/// Speech synthesis parameters attached to narrated audio or captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParams {
    pub voice_id: String,
    #[serde(default = "unit")]
    pub rate: f32,
    #[serde(default = "unit")]
    pub pitch: f32,
}

fn unit() -> f32 {
    1.0
}

/// Kind-specific clip data.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipPayload {
    Video {
        volume: f32,
        speed: f32,
    },
    Audio {
        volume: f32,
        speed: f32,
        source_url: Option<String>,
        metadata: Option<serde_json::Value>,
        voice: Option<VoiceParams>,
    },
    Caption {
        text: String,
        voice: Option<VoiceParams>,
    },
    Image,
}

impl ClipPayload {
    /// Lane that holds clips carrying this payload.
    pub fn lane(&self) -> LaneKind {
        match self {
            ClipPayload::Video { .. } => LaneKind::Program,
            ClipPayload::Audio { .. } => LaneKind::OverlayAudio,
            ClipPayload::Caption { .. } => LaneKind::OverlayCaption,
            ClipPayload::Image => LaneKind::OverlayImage,
        }
    }

    /// Wire name of the clip type.
    pub fn type_name(&self) -> &'static str {
        match self {
            ClipPayload::Video { .. } => "video",
            ClipPayload::Audio { .. } => "audio",
            ClipPayload::Caption { .. } => "caption",
            ClipPayload::Image => "image",
        }
    }
}

/// A timed reference to media or text placed on a lane.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub id: ClipId,
    /// Seconds from the start of the timeline.
    pub start: f64,
    pub duration: f64,
    /// Seconds into the referenced asset where playback begins.
    pub source_in: f64,
    pub label: String,
    pub asset_id: Option<String>,
    /// Full length of the referenced media, when known.
    pub source_duration: Option<f64>,
    pub payload: ClipPayload,
}

impl Clip {
    fn with_payload(id: impl Into<ClipId>, duration: f64, payload: ClipPayload) -> Self {
        Self {
            id: id.into(),
            start: 0.0,
            duration,
            source_in: 0.0,
            label: String::new(),
            asset_id: None,
            source_duration: None,
            payload,
        }
    }

    pub fn video(id: impl Into<ClipId>, duration: f64) -> Self {
        Self::with_payload(
            id,
            duration,
            ClipPayload::Video {
                volume: 1.0,
                speed: 1.0,
            },
        )
    }

    pub fn audio(id: impl Into<ClipId>, duration: f64) -> Self {
        Self::with_payload(
            id,
            duration,
            ClipPayload::Audio {
                volume: 1.0,
                speed: 1.0,
                source_url: None,
                metadata: None,
                voice: None,
            },
        )
    }

    pub fn caption(id: impl Into<ClipId>, duration: f64, text: impl Into<String>) -> Self {
        Self::with_payload(
            id,
            duration,
            ClipPayload::Caption {
                text: text.into(),
                voice: None,
            },
        )
    }

    pub fn image(id: impl Into<ClipId>, duration: f64) -> Self {
        Self::with_payload(id, duration, ClipPayload::Image)
    }

    pub fn at(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_asset(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    pub fn with_source(mut self, source_in: f64, source_duration: Option<f64>) -> Self {
        self.source_in = source_in;
        self.source_duration = source_duration;
        self
    }

    pub fn lane(&self) -> LaneKind {
        self.payload.lane()
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Caption text, if the clip carries any.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            ClipPayload::Caption { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn volume(&self) -> Option<f32> {
        match &self.payload {
            ClipPayload::Video { volume, .. } | ClipPayload::Audio { volume, .. } => Some(*volume),
            _ => None,
        }
    }

    pub fn speed(&self) -> Option<f32> {
        match &self.payload {
            ClipPayload::Video { speed, .. } | ClipPayload::Audio { speed, .. } => Some(*speed),
            _ => None,
        }
    }

    /// Longest duration the clip can reach from its current source-in offset.
    /// Text and still clips are unbounded.
    pub fn source_limit(&self) -> Option<f64> {
        match self.payload {
            ClipPayload::Video { .. } | ClipPayload::Audio { .. } => self
                .source_duration
                .map(|total| (total - self.source_in).max(0.0)),
            ClipPayload::Caption { .. } | ClipPayload::Image => None,
        }
    }

    /// Clamps negative or non-finite offsets and rejects clips without a
    /// positive duration.
    pub fn sanitized(mut self) -> Option<Self> {
        if self.id.trim().is_empty() || !self.duration.is_finite() || self.duration <= 0.0 {
            return None;
        }
        self.start = finite_non_negative(self.start);
        self.source_in = finite_non_negative(self.source_in);
        self.source_duration = self
            .source_duration
            .filter(|value| value.is_finite() && *value > 0.0);
        Some(self)
    }
}

fn finite_non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
