//! Lazily populated asset metadata: thumbnail strips, waveforms and preview
//! buffers.

use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipPayload};

/// Fetch state of one cache entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<V> {
    Pending,
    Ready(V),
    Failed,
}

/// Keyed cache with in-flight de-duplication.
#[derive(Debug)]
pub struct MetadataCache<V> {
    entries: HashMap<String, FetchState<V>>,
    hits: u64,
    misses: u64,
}

impl<V> Default for MetadataCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<V> MetadataCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as requested. Returns `true` only when the caller should
    /// start a fetch; pending, ready and failed keys are left alone.
    pub fn request(&mut self, key: &str) -> bool {
        if self.entries.contains_key(key) {
            self.hits += 1;
            return false;
        }
        self.misses += 1;
        self.entries.insert(key.to_string(), FetchState::Pending);
        true
    }

    pub fn fulfil(&mut self, key: &str, value: V) {
        self.entries.insert(key.to_string(), FetchState::Ready(value));
    }

    /// Records a failed fetch; the entry renders with a fallback from now on.
    pub fn fail(&mut self, key: &str) {
        tracing::debug!(key, "asset metadata fetch failed, using fallback");
        self.entries.insert(key.to_string(), FetchState::Failed);
    }

    pub fn state(&self, key: &str) -> Option<&FetchState<V>> {
        self.entries.get(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        match self.entries.get(key) {
            Some(FetchState::Ready(value)) => Some(value),
            _ => None,
        }
    }

    /// Forgets a key so it can be fetched again.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

/// Thumbnail image URLs covering an asset left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailStrip {
    pub frames: Vec<String>,
    pub interval_seconds: f64,
}

/// Normalized peak amplitudes in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    pub peaks: Vec<f32>,
}

/// What to draw inside a clip's thumbnail area.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailView<'a> {
    Strip(&'a ThumbnailStrip),
    Skeleton,
}

/// Peaks to draw for an audio clip.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveformView<'a> {
    Peaks(&'a [f32]),
    /// Deterministic stand-in bars while real peaks are missing.
    Synthetic(Vec<f32>),
}

/// Cache key for waveform data: the asset id, or the audio URL for clips
/// without one.
pub fn waveform_key(clip: &Clip) -> Option<String> {
    if let Some(asset) = &clip.asset_id {
        return Some(format!("asset:{asset}"));
    }
    match &clip.payload {
        ClipPayload::Audio {
            source_url: Some(url),
            ..
        } => Some(format!("url:{url}")),
        _ => None,
    }
}

/// Stand-in bars derived from the clip id so a clip always shows the same
/// shape.
pub fn synthetic_peaks(seed: &str, bars: usize) -> Vec<f32> {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    let mut state = hasher.finish() | 1;
    (0..bars)
        .map(|_| {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            0.2 + (state % 1_000) as f32 / 1_000.0 * 0.6
        })
        .collect()
}

/// Thumbnail and waveform caches shared by every clip on the timeline.
#[derive(Debug, Default)]
pub struct AssetCaches {
    pub thumbnails: MetadataCache<ThumbnailStrip>,
    pub waveforms: MetadataCache<Waveform>,
}

impl AssetCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys that need fetching for `clip`: (thumbnail asset, waveform key).
    pub fn requests_for(&mut self, clip: &Clip) -> (Option<String>, Option<String>) {
        let thumbnail = match (&clip.payload, &clip.asset_id) {
            (ClipPayload::Video { .. } | ClipPayload::Image, Some(asset)) => {
                self.thumbnails.request(asset).then(|| asset.clone())
            }
            _ => None,
        };
        let waveform = match clip.payload {
            ClipPayload::Audio { .. } | ClipPayload::Video { .. } => waveform_key(clip)
                .filter(|key| self.waveforms.request(key)),
            _ => None,
        };
        (thumbnail, waveform)
    }

    pub fn thumbnail_view(&self, clip: &Clip) -> ThumbnailView<'_> {
        clip.asset_id
            .as_deref()
            .and_then(|asset| self.thumbnails.get(asset))
            .map(ThumbnailView::Strip)
            .unwrap_or(ThumbnailView::Skeleton)
    }

    pub fn waveform_view(&self, clip: &Clip, bars: usize) -> WaveformView<'_> {
        waveform_key(clip)
            .and_then(|key| self.waveforms.get(&key))
            .map(|waveform| WaveformView::Peaks(&waveform.peaks))
            .unwrap_or_else(|| WaveformView::Synthetic(synthetic_peaks(&clip.id, bars)))
    }
}

/// Releases host resources backing a preview buffer.
pub trait BufferReleaser {
    fn release(&mut self, handle: &str);
}

/// Releaser for hosts that keep no native handles; releases are only logged.
#[derive(Debug, Default)]
pub struct TracingReleaser;

impl BufferReleaser for TracingReleaser {
    fn release(&mut self, handle: &str) {
        tracing::debug!(handle, "released preview buffer");
    }
}

/// Temporary local buffers created for previewing fetched media, tracked by
/// the clip that owns them.
#[derive(Debug, Default)]
pub struct PreviewBuffers {
    by_clip: HashMap<String, Vec<String>>,
}

impl PreviewBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, clip_id: &str, handle: impl Into<String>) {
        self.by_clip
            .entry(clip_id.to_string())
            .or_default()
            .push(handle.into());
    }

    pub fn handles(&self, clip_id: &str) -> &[String] {
        self.by_clip.get(clip_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Releases every buffer owned by `clip_id`.
    pub fn release_clip<R: BufferReleaser + ?Sized>(&mut self, clip_id: &str, releaser: &mut R) -> usize {
        let handles = self.by_clip.remove(clip_id).unwrap_or_default();
        for handle in &handles {
            releaser.release(handle);
        }
        handles.len()
    }

    /// Releases buffers whose owning clip no longer satisfies `alive`.
    pub fn release_orphans<R, F>(&mut self, alive: F, releaser: &mut R) -> usize
    where
        R: BufferReleaser + ?Sized,
        F: Fn(&str) -> bool,
    {
        let orphaned: Vec<String> = self
            .by_clip
            .keys()
            .filter(|id| !alive(id))
            .cloned()
            .collect();
        orphaned
            .iter()
            .map(|id| self.release_clip(id, releaser))
            .sum()
    }

    pub fn release_all<R: BufferReleaser + ?Sized>(&mut self, releaser: &mut R) -> usize {
        self.release_orphans(|_| false, releaser)
    }

    pub fn len(&self) -> usize {
        self.by_clip.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_clip.is_empty()
    }
}
