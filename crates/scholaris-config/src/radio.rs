use std::path::PathBuf;

use crate::{env_or, env_string_or};

/// Radio schedule storage and text-to-speech pacing.
///
/// `words_per_second` converts elapsed airtime into a word offset when a
/// listener joins a text program midway.
#[derive(Clone, Debug)]
pub struct RadioConfig {
    pub store_path: PathBuf,
    pub words_per_chunk: usize,
    pub words_per_second: f64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("radio-programs.json"),
            words_per_chunk: 30,
            words_per_second: 2.5,
        }
    }
}

impl RadioConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_path: PathBuf::from(env_string_or(
                "RADIO_STORE_PATH",
                &defaults.store_path.to_string_lossy(),
            )),
            words_per_chunk: env_or("RADIO_WORDS_PER_CHUNK", defaults.words_per_chunk).max(1),
            words_per_second: env_or("RADIO_WORDS_PER_SECOND", defaults.words_per_second),
        }
    }
}
