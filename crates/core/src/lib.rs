//! Core library for the timeline editing engine.
//!
//! The crate owns the authoritative clip store and everything that edits it:
//! lane packing, time/pixel conversion, pointer-driven drag and resize,
//! selection, split and delete, and debounced persistence against a remote
//! store. Rendering hosts drive a [`TimelineEditor`] and draw from the state
//! it exposes.

pub mod assets;
pub mod clip;
pub mod config;
pub mod coords;
pub mod edit;
pub mod editor;
pub mod error;
pub mod ingest;
pub mod interaction;
pub mod packing;
pub mod render;
pub mod selection;
pub mod sync;
pub mod timeline;
pub mod wire;

pub use assets::{AssetCaches, BufferReleaser, PreviewBuffers, TracingReleaser};
pub use clip::{Clip, ClipId, ClipPayload, LaneKind};
pub use config::{CaptionStyle, EditorConfig, InteractionConfig, ZoomConfig};
pub use coords::CoordinateModel;
pub use editor::{HitTarget, TimelineEditor};
pub use error::{Result, TimelineError};
pub use ingest::{Cue, DropPayload};
pub use interaction::{ClipInteraction, InteractionContext, Release, Viewport};
pub use packing::{pack_rows, RowPacking};
pub use render::CompositorFeed;
pub use selection::{Selection, SelectionEntry};
pub use sync::{MemoryStore, PersistenceSync, SaveStatus, TimelineStore};
pub use timeline::Timeline;
pub use wire::{SaveAck, SavePayload, WireTimeline};
