//! Translation of drag-and-drop payloads and imported cue lists into clips.

use serde::{Deserialize, Serialize};

use crate::{
    clip::{Clip, ClipPayload, LaneKind},
    timeline::Timeline,
};

/// Duration given to dropped stills and text without an explicit one.
pub const DEFAULT_STILL_SECONDS: f64 = 3.0;

/// Asset description produced by a drag source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPayload {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Pre-timed caption cue parsed from a subtitle file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl DropPayload {
    /// Builds a clip for this payload, or `None` when the payload does not
    /// describe anything placeable.
    pub fn into_clip(self, id: String, start: f64) -> Option<Clip> {
        let duration = self.duration.filter(|d| d.is_finite() && *d > 0.0);
        let clip = match self.kind.to_ascii_lowercase().as_str() {
            "video" => Clip::video(id, duration?),
            "audio" | "music" | "voiceover" => {
                let mut clip = Clip::audio(id, duration?);
                if let ClipPayload::Audio { source_url, .. } = &mut clip.payload {
                    *source_url = self.url;
                }
                clip
            }
            "image" => Clip::image(id, duration.unwrap_or(DEFAULT_STILL_SECONDS)),
            "text" | "caption" => {
                let text = self.text.unwrap_or_else(|| self.name.clone());
                Clip::caption(id, duration.unwrap_or(DEFAULT_STILL_SECONDS), text)
            }
            _ => return None,
        };

        let source_duration = match clip.lane() {
            LaneKind::Program | LaneKind::OverlayAudio => duration,
            _ => None,
        };
        let mut clip = clip
            .at(start)
            .with_label(self.name)
            .with_source(0.0, source_duration);
        clip.asset_id = self.asset_id;
        clip.sanitized()
    }
}

impl Timeline {
    /// Places a dropped asset at `at` seconds. Program drops are inserted at
    /// the nearest boundary. Returns the new clip id, or `None` when the
    /// payload was discarded.
    pub fn drop_asset(&mut self, payload: DropPayload, at: f64) -> Option<String> {
        let base = payload
            .asset_id
            .clone()
            .unwrap_or_else(|| payload.kind.to_ascii_lowercase());
        let id = self.fresh_id(&base);
        let Some(clip) = payload.into_clip(id.clone(), at) else {
            tracing::debug!(at, "discarding malformed drop payload");
            return None;
        };

        let result = if clip.lane().is_program() {
            let center = at.max(0.0) + clip.duration * 0.5;
            self.insert_program_near(clip, center)
        } else {
            self.insert(clip)
        };
        match result {
            Ok(()) => Some(id),
            Err(err) => {
                tracing::warn!(%err, "dropped asset rejected");
                None
            }
        }
    }

    /// Inserts caption cues in bulk. Cues without text or with a
    /// non-positive length are skipped. Returns the inserted ids.
    pub fn insert_cues(&mut self, cues: &[Cue]) -> Vec<String> {
        let mut inserted = Vec::with_capacity(cues.len());
        for cue in cues {
            if cue.text.trim().is_empty() || !(cue.end > cue.start) {
                continue;
            }
            let id = self.fresh_id("cue");
            let clip = Clip::caption(id.clone(), cue.end - cue.start, cue.text.trim()).at(cue.start);
            if self.insert(clip).is_ok() {
                inserted.push(id);
            }
        }
        tracing::debug!(count = inserted.len(), "inserted caption cues");
        inserted
    }
}
