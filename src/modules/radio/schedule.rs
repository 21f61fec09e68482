//! Live selection and playback positioning for the radio schedule.
//!
//! A program is live while `start <= now < start + duration`. A listener who
//! tunes in midway joins at `current_offset` seconds: audio seeks there, text
//! skips the words that would already have been spoken.

use chrono::{DateTime, Utc};

use super::model::{LiveProgram, PlaybackPlan, RadioProgram};

/// Speech pacing used to turn elapsed seconds into a word position.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub words_per_chunk: usize,
    pub words_per_second: f64,
}

pub fn is_live(program: &RadioProgram, now: DateTime<Utc>) -> bool {
    program.duration_seconds > 0
        && program.scheduled_for <= now
        && program.ends_at().is_some_and(|end| now < end)
}

/// Seconds since the program started, clamped to `[0, duration]`.
pub fn current_offset(program: &RadioProgram, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - program.scheduled_for).num_seconds();
    elapsed.clamp(0, program.duration_seconds.max(0))
}

pub fn chunk_words(text: &str, words_per_chunk: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(words_per_chunk.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Audio wins when the program has an audio file; otherwise its text is read.
pub fn playback_plan(program: &RadioProgram, offset: i64, pacing: Pacing) -> Option<PlaybackPlan> {
    if let Some(url) = program.audio_url() {
        return Some(PlaybackPlan::Audio {
            file_url: url.to_string(),
            seek_seconds: offset,
        });
    }

    let text = program.text()?;
    let per_chunk = pacing.words_per_chunk.max(1);
    let chunks = chunk_words(text, per_chunk);
    let total_words = text.split_whitespace().count();

    let spoken = (offset.max(0) as f64 * pacing.words_per_second.max(0.0)).floor() as usize;
    let (start_chunk, start_word) = if spoken >= total_words {
        (chunks.len(), 0)
    } else {
        (spoken / per_chunk, spoken % per_chunk)
    };

    Some(PlaybackPlan::Speech {
        chunks,
        start_chunk,
        start_word,
        words_per_second: pacing.words_per_second,
    })
}

/// Programs on air at `now`, earliest start first.
pub fn live_programs(programs: &[RadioProgram], now: DateTime<Utc>, pacing: Pacing) -> Vec<LiveProgram> {
    let mut live: Vec<LiveProgram> = programs
        .iter()
        .filter(|p| is_live(p, now))
        .map(|p| {
            let offset = current_offset(p, now);
            LiveProgram {
                program: p.clone(),
                current_offset: offset,
                remaining_seconds: p.duration_seconds - offset,
                playback: playback_plan(p, offset, pacing),
            }
        })
        .collect();
    live.sort_by(|a, b| a.program.scheduled_for.cmp(&b.program.scheduled_for));
    live
}
