//! Debounced optimistic-concurrency persistence.
//!
//! Local edits only mark the synchronizer dirty. Once the debounce window has
//! passed, the whole timeline is written with the last acknowledged revision.
//! A revision conflict triggers exactly one re-fetch and retry; anything
//! beyond that is reported and left for the next cycle.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::{
    wire::{to_payload, SaveAck, SavePayload, WireTimeline},
    timeline::Timeline,
    Result, TimelineError,
};

/// Remote timeline endpoint.
pub trait TimelineStore {
    fn fetch(&mut self, project_id: &str) -> Result<WireTimeline>;

    /// Writes `payload`. A stale `payload.revision` must be rejected with
    /// [`TimelineError::Conflict`].
    fn save(&mut self, project_id: &str, payload: &SavePayload) -> Result<SaveAck>;
}

/// In-process store that enforces revisions the way the remote one does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<String, WireTimeline>,
    writes: Vec<SavePayload>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(project_id: impl Into<String>, document: WireTimeline) -> Self {
        let mut store = Self::new();
        store.documents.insert(project_id.into(), document);
        store
    }

    pub fn document(&self, project_id: &str) -> Option<&WireTimeline> {
        self.documents.get(project_id)
    }

    /// Every accepted write, oldest first.
    pub fn writes(&self) -> &[SavePayload] {
        &self.writes
    }

    /// Simulates another writer advancing the stored revision.
    pub fn bump_revision(&mut self, project_id: &str) -> u64 {
        let document = self
            .documents
            .entry(project_id.to_string())
            .or_insert_with(empty_document);
        document.revision += 1;
        document.revision
    }
}

fn empty_document() -> WireTimeline {
    WireTimeline {
        tracks: Vec::new(),
        fps: None,
        revision: 0,
        duration_seconds: 0.0,
    }
}

impl TimelineStore for MemoryStore {
    fn fetch(&mut self, project_id: &str) -> Result<WireTimeline> {
        self.documents
            .get(project_id)
            .cloned()
            .ok_or_else(|| TimelineError::Store(format!("project `{project_id}` not found")))
    }

    fn save(&mut self, project_id: &str, payload: &SavePayload) -> Result<SaveAck> {
        let document = self
            .documents
            .entry(project_id.to_string())
            .or_insert_with(empty_document);
        if document.revision != payload.revision {
            return Err(TimelineError::Conflict {
                sent: payload.revision,
                current: document.revision,
            });
        }

        let duration_seconds = payload
            .tracks
            .iter()
            .flat_map(|track| track.clips.iter())
            .map(|clip| clip.start + clip.duration_seconds)
            .fold(0.0, f64::max);
        *document = WireTimeline {
            tracks: payload.tracks.clone(),
            fps: Some(payload.fps),
            revision: payload.revision + 1,
            duration_seconds,
        };
        self.writes.push(payload.clone());

        Ok(SaveAck {
            success: true,
            timeline: document.clone(),
            duration_seconds,
        })
    }
}

/// A write handed to the host to execute.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub payload: SavePayload,
    generation: u64,
}

/// Outcome of a completed save cycle.
#[derive(Debug)]
pub enum SaveStatus {
    Saved { revision: u64 },
    /// Saved after recovering from one revision conflict.
    Retried { revision: u64 },
    Failed { error: TimelineError },
}

impl SaveStatus {
    pub fn revision(&self) -> Option<u64> {
        match self {
            SaveStatus::Saved { revision } | SaveStatus::Retried { revision } => Some(*revision),
            SaveStatus::Failed { .. } => None,
        }
    }
}

/// Single-flight, debounced writer for one project.
#[derive(Debug)]
pub struct PersistenceSync {
    project_id: String,
    debounce: Duration,
    dirty: bool,
    due_at: Option<Instant>,
    /// Bumped on every local edit.
    generation: u64,
    in_flight: bool,
}

impl PersistenceSync {
    pub fn new(project_id: impl Into<String>, debounce: Duration) -> Self {
        Self {
            project_id: project_id.into(),
            debounce,
            dirty: false,
            due_at: None,
            generation: 0,
            in_flight: false,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.due_at
    }

    /// Records a local edit and restarts the debounce window.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty = true;
        self.generation += 1;
        self.due_at = Some(now + self.debounce);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.dirty && self.due_at.map(|due| due <= now).unwrap_or(true)
    }

    /// Claims the in-flight slot and serializes the timeline if a save is
    /// due. Requests made while a save is running are dropped; the dirty flag
    /// makes the next cycle pick up their edits.
    pub fn begin(&mut self, now: Instant, timeline: &Timeline) -> Option<SaveRequest> {
        if !self.is_due(now) {
            return None;
        }
        if self.in_flight {
            tracing::debug!(project = %self.project_id, "save already in flight, coalescing");
            return None;
        }
        self.in_flight = true;
        Some(SaveRequest {
            payload: to_payload(timeline),
            generation: self.generation,
        })
    }

    /// Finishes a save started with [`begin`](Self::begin). On a conflict the
    /// remote revision is re-fetched and the current local state is written
    /// once more against it.
    pub fn complete<S: TimelineStore + ?Sized>(
        &mut self,
        request: SaveRequest,
        result: Result<SaveAck>,
        now: Instant,
        timeline: &mut Timeline,
        store: &mut S,
    ) -> SaveStatus {
        let status = match result.and_then(acknowledged) {
            Ok(revision) => {
                self.adopt(revision, request.generation, timeline);
                SaveStatus::Saved { revision }
            }
            Err(err) if err.is_conflict() => {
                tracing::debug!(project = %self.project_id, %err, "revision conflict, retrying once");
                match self.retry(timeline, store) {
                    Ok((revision, generation)) => {
                        self.adopt(revision, generation, timeline);
                        SaveStatus::Retried { revision }
                    }
                    Err(error) => SaveStatus::Failed { error },
                }
            }
            Err(error) => SaveStatus::Failed { error },
        };

        self.in_flight = false;
        match &status {
            SaveStatus::Failed { error } => {
                tracing::warn!(project = %self.project_id, %error, "timeline save failed");
                self.due_at = Some(now + self.debounce);
            }
            SaveStatus::Saved { revision } | SaveStatus::Retried { revision } => {
                tracing::info!(project = %self.project_id, revision, "timeline saved");
            }
        }
        status
    }

    fn retry<S: TimelineStore + ?Sized>(
        &mut self,
        timeline: &Timeline,
        store: &mut S,
    ) -> Result<(u64, u64)> {
        let remote = store.fetch(&self.project_id)?;
        let mut payload = to_payload(timeline);
        payload.revision = remote.revision;
        let generation = self.generation;
        let revision = acknowledged(store.save(&self.project_id, &payload)?)?;
        Ok((revision, generation))
    }

    fn adopt(&mut self, revision: u64, generation: u64, timeline: &mut Timeline) {
        timeline.set_revision(revision);
        if generation == self.generation {
            self.dirty = false;
            self.due_at = None;
        }
    }

    /// Runs one synchronous save cycle if one is due.
    pub fn tick<S: TimelineStore + ?Sized>(
        &mut self,
        now: Instant,
        timeline: &mut Timeline,
        store: &mut S,
    ) -> Option<SaveStatus> {
        let request = self.begin(now, timeline)?;
        let result = store.save(&self.project_id, &request.payload);
        Some(self.complete(request, result, now, timeline, store))
    }

    /// Saves immediately, ignoring the debounce window.
    pub fn flush<S: TimelineStore + ?Sized>(
        &mut self,
        now: Instant,
        timeline: &mut Timeline,
        store: &mut S,
    ) -> Option<SaveStatus> {
        if self.dirty {
            self.due_at = Some(now);
        }
        self.tick(now, timeline, store)
    }
}

fn acknowledged(ack: SaveAck) -> Result<u64> {
    if ack.success {
        Ok(ack.timeline.revision)
    } else {
        Err(TimelineError::Store("store did not accept the write".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;

    const PROJECT: &str = "project-1";

    fn debounce() -> Duration {
        Duration::from_millis(300)
    }

    fn timeline_with_clip() -> Timeline {
        let mut timeline = Timeline::new(30.0);
        timeline.insert(Clip::video("a", 5.0)).unwrap();
        timeline
    }

    /// Store that always answers with a conflict.
    struct AlwaysConflicting {
        saves: usize,
    }

    impl TimelineStore for AlwaysConflicting {
        fn fetch(&mut self, _project_id: &str) -> Result<WireTimeline> {
            Ok(empty_document())
        }

        fn save(&mut self, _project_id: &str, payload: &SavePayload) -> Result<SaveAck> {
            self.saves += 1;
            Err(TimelineError::Conflict {
                sent: payload.revision,
                current: payload.revision + 1,
            })
        }
    }

    #[test]
    fn waits_for_the_debounce_window() {
        let start = Instant::now();
        let mut store = MemoryStore::new();
        let mut timeline = timeline_with_clip();
        let mut sync = PersistenceSync::new(PROJECT, debounce());

        sync.mark_dirty(start);
        assert!(sync.tick(start + Duration::from_millis(100), &mut timeline, &mut store).is_none());

        let status = sync
            .tick(start + Duration::from_millis(300), &mut timeline, &mut store)
            .unwrap();
        assert_eq!(status.revision(), Some(1));
        assert_eq!(timeline.revision(), 1);
        assert!(!sync.is_dirty());
    }

    #[test]
    fn edits_restart_the_debounce() {
        let start = Instant::now();
        let mut sync = PersistenceSync::new(PROJECT, debounce());
        sync.mark_dirty(start);
        sync.mark_dirty(start + Duration::from_millis(200));
        assert!(!sync.is_due(start + Duration::from_millis(400)));
        assert!(sync.is_due(start + Duration::from_millis(500)));
    }

    #[test]
    fn conflict_is_retried_at_the_fresh_revision() {
        let now = Instant::now();
        let mut store = MemoryStore::new();
        store.bump_revision(PROJECT);
        store.bump_revision(PROJECT);

        let mut timeline = timeline_with_clip();
        timeline.set_revision(1);
        let mut sync = PersistenceSync::new(PROJECT, debounce());
        sync.mark_dirty(now);

        let status = sync.flush(now, &mut timeline, &mut store).unwrap();
        assert!(matches!(status, SaveStatus::Retried { revision: 3 }));
        assert_eq!(timeline.revision(), 3);
        assert!(!sync.is_dirty());

        let written = &store.writes()[0];
        assert_eq!(written.revision, 2);
        assert!(written
            .tracks
            .iter()
            .any(|track| track.clips.iter().any(|clip| clip.id == "a")));
    }

    #[test]
    fn second_conflict_is_surfaced_and_stays_dirty() {
        let now = Instant::now();
        let mut store = AlwaysConflicting { saves: 0 };
        let mut timeline = timeline_with_clip();
        let mut sync = PersistenceSync::new(PROJECT, debounce());
        sync.mark_dirty(now);

        let status = sync.flush(now, &mut timeline, &mut store).unwrap();
        assert!(matches!(status, SaveStatus::Failed { ref error } if error.is_conflict()));
        assert_eq!(store.saves, 2);
        assert!(sync.is_dirty());
        assert!(!sync.is_busy());
        assert_eq!(sync.due_at(), Some(now + debounce()));
    }

    #[test]
    fn requests_while_in_flight_are_dropped() {
        let now = Instant::now();
        let mut store = MemoryStore::new();
        let mut timeline = timeline_with_clip();
        let mut sync = PersistenceSync::new(PROJECT, Duration::ZERO);
        sync.mark_dirty(now);

        let request = sync.begin(now, &timeline).unwrap();
        sync.mark_dirty(now);
        assert!(sync.begin(now, &timeline).is_none());

        let result = store.save(PROJECT, &request.payload);
        sync.complete(request, result, now, &mut timeline, &mut store);

        // the edit made during the flight keeps the synchronizer dirty
        assert!(sync.is_dirty());
        timeline.insert(Clip::video("b", 1.0)).unwrap();
        let status = sync.tick(now, &mut timeline, &mut store).unwrap();
        assert_eq!(status.revision(), Some(2));
        assert_eq!(store.writes().len(), 2);
        assert!(!sync.is_dirty());
    }

    #[test]
    fn store_errors_are_reported() {
        let now = Instant::now();
        let mut store = MemoryStore::new();
        assert!(matches!(store.fetch("missing"), Err(TimelineError::Store(_))));

        let mut timeline = Timeline::new(30.0);
        let mut sync = PersistenceSync::new(PROJECT, Duration::ZERO);
        sync.mark_dirty(now);
        let request = sync.begin(now, &timeline).unwrap();
        let status = sync.complete(
            request,
            Err(TimelineError::Store("offline".into())),
            now,
            &mut timeline,
            &mut store,
        );
        assert!(matches!(status, SaveStatus::Failed { .. }));
        assert_eq!(timeline.revision(), 0);
    }
}
