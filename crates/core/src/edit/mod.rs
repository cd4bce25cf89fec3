//! Structural edits: split, merge and delete.

use crate::{
    clip::{Clip, ClipId, ClipPayload},
    coords::frame_duration,
    timeline::Timeline,
    Result, TimelineError,
};

/// Splits `text` by word count so the left side holds roughly `ratio` of the
/// words. Both sides keep at least one word when there are two or more;
/// a single word stays on whichever side covers more time.
pub fn partition_words(text: &str, ratio: f64) -> (String, String) {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.len() {
        0 => (String::new(), String::new()),
        1 if ratio >= 0.5 => (words[0].to_string(), String::new()),
        1 => (String::new(), words[0].to_string()),
        count => {
            let cut = (ratio.clamp(0.0, 1.0) * count as f64).round() as usize;
            let cut = cut.clamp(1, count - 1);
            (words[..cut].join(" "), words[cut..].join(" "))
        }
    }
}

/// Cuts `clip` at timeline time `at`, returning the left and right pieces.
///
/// The cut must fall more than one frame inside the clip. The left piece
/// keeps the original id and source offset; the right piece takes
/// `right_id` and starts reading the source where the left piece stops.
pub fn split_clip(clip: &Clip, at: f64, fps: f64, right_id: ClipId) -> Result<(Clip, Clip)> {
    let tolerance = frame_duration(fps).max(f64::EPSILON);
    if !at.is_finite() || at <= clip.start + tolerance || at >= clip.end() - tolerance {
        return Err(TimelineError::InvalidSplit {
            id: clip.id.clone(),
            at,
        });
    }

    let left_duration = at - clip.start;
    let mut left = clip.clone();
    left.duration = left_duration;

    let mut right = clip.clone();
    right.id = right_id;
    right.start = at;
    right.duration = clip.duration - left_duration;
    right.source_in = clip.source_in + left_duration;

    if let ClipPayload::Caption { text, .. } = &clip.payload {
        if !text.trim().is_empty() {
            let (head, tail) = partition_words(text, left_duration / clip.duration);
            set_caption_text(&mut left, head);
            set_caption_text(&mut right, tail);
        }
    }

    Ok((left, right))
}

/// Joins two adjacent pieces of the same kind back into one clip carrying
/// the left piece's identity.
pub fn merge_clips(left: &Clip, right: &Clip) -> Result<Clip> {
    if left.lane() != right.lane() {
        return Err(TimelineError::msg("only clips on the same lane can be merged"));
    }
    if (left.end() - right.start).abs() > crate::packing::OVERLAP_EPSILON {
        return Err(TimelineError::msg(format!(
            "clips `{}` and `{}` are not adjacent",
            left.id, right.id
        )));
    }

    let mut merged = left.clone();
    merged.duration = left.duration + right.duration;
    if let (Some(head), Some(tail)) = (left.text(), right.text()) {
        let joined = [head, tail]
            .iter()
            .flat_map(|part| part.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        set_caption_text(&mut merged, joined);
    }
    Ok(merged)
}

fn set_caption_text(clip: &mut Clip, value: String) {
    if let ClipPayload::Caption { text, .. } = &mut clip.payload {
        *text = value;
    }
}

/// Ids of the two clips produced by a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub left: ClipId,
    pub right: ClipId,
}

impl Timeline {
    /// Splits the clip `id` at timeline time `at`.
    pub fn split(&mut self, id: &str, at: f64) -> Result<SplitOutcome> {
        let clip = self
            .find(id)
            .cloned()
            .ok_or_else(|| TimelineError::ClipNotFound(id.to_string()))?;
        let right_id = self.fresh_id(id);
        let (left, right) = split_clip(&clip, at, self.fps(), right_id)?;
        let outcome = SplitOutcome {
            left: left.id.clone(),
            right: right.id.clone(),
        };
        self.replace(id, vec![left, right])?;
        tracing::debug!(id, at, right = %outcome.right, "split clip");
        Ok(outcome)
    }

    /// Re-joins two adjacent clips produced by a split.
    pub fn merge(&mut self, left_id: &str, right_id: &str) -> Result<ClipId> {
        let left = self
            .find(left_id)
            .cloned()
            .ok_or_else(|| TimelineError::ClipNotFound(left_id.to_string()))?;
        let right = self
            .find(right_id)
            .cloned()
            .ok_or_else(|| TimelineError::ClipNotFound(right_id.to_string()))?;
        let merged = merge_clips(&left, &right)?;
        self.remove(right_id)?;
        self.replace(left_id, vec![merged])?;
        Ok(left.id)
    }

    /// Removes every listed clip, skipping ids that are already gone.
    pub fn delete_many<'a, I>(&mut self, ids: I) -> Vec<Clip>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter()
            .filter_map(|id| self.remove(id).ok())
            .collect()
    }
}
