use std::path::{Path, PathBuf};

use timeline_editor_core::{
    wire::{SaveAck, SavePayload, WireTimeline},
    Result, TimelineError, TimelineStore,
};

/// Timeline store backed by one JSON document per project inside a
/// directory. Writes are revision-checked like the remote service.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, project_id: &str) -> PathBuf {
        self.root.join(format!("{project_id}.json"))
    }

    fn read(&self, path: &Path) -> Result<WireTimeline> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl TimelineStore for FileStore {
    fn fetch(&mut self, project_id: &str) -> Result<WireTimeline> {
        let path = self.path_for(project_id);
        if !path.exists() {
            return Err(TimelineError::Store(format!(
                "no timeline at {}",
                path.display()
            )));
        }
        self.read(&path)
    }

    fn save(&mut self, project_id: &str, payload: &SavePayload) -> Result<SaveAck> {
        let path = self.path_for(project_id);
        let current = if path.exists() {
            self.read(&path)?.revision
        } else {
            0
        };
        if current != payload.revision {
            return Err(TimelineError::Conflict {
                sent: payload.revision,
                current,
            });
        }

        let duration_seconds = payload
            .tracks
            .iter()
            .flat_map(|track| track.clips.iter())
            .map(|clip| clip.start + clip.duration_seconds)
            .fold(0.0, f64::max);
        let document = WireTimeline {
            tracks: payload.tracks.clone(),
            fps: Some(payload.fps),
            revision: payload.revision + 1,
            duration_seconds,
        };
        std::fs::create_dir_all(&self.root)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&document)?)?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!(path = %path.display(), revision = document.revision, "wrote timeline");

        Ok(SaveAck {
            success: true,
            timeline: document,
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_editor_core::{wire::to_payload, Clip, Timeline};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("timeline-store-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn writes_bump_the_revision_and_reject_stale_ones() {
        let dir = scratch_dir("revisions");
        let mut store = FileStore::new(&dir);
        let mut timeline = Timeline::new(30.0);
        timeline.insert(Clip::video("a", 2.0)).unwrap();

        let ack = store.save("demo", &to_payload(&timeline)).unwrap();
        assert_eq!(ack.timeline.revision, 1);
        assert_eq!(store.fetch("demo").unwrap().revision, 1);

        let err = store.save("demo", &to_payload(&timeline)).unwrap_err();
        assert!(err.is_conflict());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_projects_fail_to_fetch() {
        let mut store = FileStore::new(scratch_dir("missing"));
        assert!(matches!(store.fetch("nope"), Err(TimelineError::Store(_))));
    }
}
