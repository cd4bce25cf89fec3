//! JSON payloads exchanged with the remote timeline store.

use serde::{Deserialize, Serialize};

use crate::{
    clip::{Clip, ClipPayload, LaneKind, VoiceParams},
    timeline::Timeline,
};

/// Track kind names used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireTrackKind {
    Video,
    Audio,
    Caption,
    Image,
}

impl From<LaneKind> for WireTrackKind {
    fn from(lane: LaneKind) -> Self {
        match lane {
            LaneKind::Program => WireTrackKind::Video,
            LaneKind::OverlayAudio => WireTrackKind::Audio,
            LaneKind::OverlayCaption => WireTrackKind::Caption,
            LaneKind::OverlayImage => WireTrackKind::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireClip {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub start: f64,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default = "full_volume")]
    pub volume: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default)]
    pub source_in_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_meta: Option<serde_json::Value>,
}

fn full_volume() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireTrack {
    pub kind: WireTrackKind,
    #[serde(default)]
    pub clips: Vec<WireClip>,
}

/// Response body of a timeline read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTimeline {
    #[serde(default)]
    pub tracks: Vec<WireTrack>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub duration_seconds: f64,
}

/// Body of a timeline write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub tracks: Vec<WireTrack>,
    pub fps: f64,
    pub revision: u64,
}

/// Successful write acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAck {
    pub success: bool,
    pub timeline: WireTimeline,
    #[serde(default)]
    pub duration_seconds: f64,
}

impl WireClip {
    pub fn from_clip(clip: &Clip) -> Self {
        let mut wire = WireClip {
            id: clip.id.clone(),
            kind: clip.payload.type_name().to_string(),
            label: clip.label.clone(),
            start: clip.start,
            duration_seconds: clip.duration,
            asset_id: clip.asset_id.clone(),
            volume: clip.volume().unwrap_or(1.0),
            speed: clip.speed(),
            source_in_seconds: clip.source_in,
            source_duration_seconds: clip.source_duration,
            text: None,
            voice: None,
            audio_url: None,
            audio_meta: None,
        };
        match &clip.payload {
            ClipPayload::Audio {
                source_url,
                metadata,
                voice,
                ..
            } => {
                wire.audio_url = source_url.clone();
                wire.audio_meta = metadata.clone();
                wire.voice = voice.clone();
            }
            ClipPayload::Caption { text, voice } => {
                wire.text = Some(text.clone());
                wire.voice = voice.clone();
            }
            ClipPayload::Video { .. } | ClipPayload::Image => {}
        }
        wire
    }

    /// Converts to a clip, using the track kind when the clip type is
    /// missing or unknown. Invalid clips yield `None`.
    pub fn into_clip(self, track: WireTrackKind) -> Option<Clip> {
        let kind = match self.kind.as_str() {
            "video" => WireTrackKind::Video,
            "audio" | "voiceover" | "music" => WireTrackKind::Audio,
            "caption" | "text" | "subtitle" => WireTrackKind::Caption,
            "image" => WireTrackKind::Image,
            _ => track,
        };
        let speed = self.speed.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(1.0);
        let payload = match kind {
            WireTrackKind::Video => ClipPayload::Video {
                volume: self.volume,
                speed,
            },
            WireTrackKind::Audio => ClipPayload::Audio {
                volume: self.volume,
                speed,
                source_url: self.audio_url,
                metadata: self.audio_meta,
                voice: self.voice,
            },
            WireTrackKind::Caption => ClipPayload::Caption {
                text: self.text.unwrap_or_default(),
                voice: self.voice,
            },
            WireTrackKind::Image => ClipPayload::Image,
        };
        Clip {
            id: self.id,
            start: self.start,
            duration: self.duration_seconds,
            source_in: self.source_in_seconds,
            label: self.label,
            asset_id: self.asset_id,
            source_duration: self.source_duration_seconds,
            payload,
        }
        .sanitized()
    }
}

/// Serializes every lane, tagging the payload with the timeline revision.
pub fn to_payload(timeline: &Timeline) -> SavePayload {
    SavePayload {
        tracks: timeline
            .lanes()
            .map(|lane| WireTrack {
                kind: lane.kind().into(),
                clips: lane.clips().iter().map(WireClip::from_clip).collect(),
            })
            .collect(),
        fps: timeline.fps(),
        revision: timeline.revision(),
    }
}

/// Rebuilds a timeline from a store response. Malformed or duplicate clips
/// are skipped.
pub fn from_wire(wire: WireTimeline, default_fps: f64) -> Timeline {
    let fps = wire
        .fps
        .filter(|fps| fps.is_finite() && *fps > 0.0)
        .unwrap_or(default_fps);
    let mut timeline = Timeline::new(fps);
    timeline.set_revision(wire.revision);

    for track in wire.tracks {
        // Program lane order follows the stored starts.
        let mut clips: Vec<Clip> = track
            .clips
            .into_iter()
            .filter_map(|clip| clip.into_clip(track.kind))
            .collect();
        clips.sort_by(|a, b| a.start.total_cmp(&b.start));
        for clip in clips {
            let id = clip.id.clone();
            if let Err(err) = timeline.insert(clip) {
                tracing::warn!(%id, %err, "skipping clip from store");
            }
        }
    }
    timeline
}
