//! Per-school radio schedule kept in a single JSON file.
//!
//! The file maps school id to an array of programs:
//!
//! ```json
//! { "7f1c...": [ { "id": "...", "title": "Morning news", "scheduledFor": "...",
//!                  "durationSeconds": 300, "content": "..." } ] }
//! ```
//!
//! Every write is a read-modify-write of the whole file under one async
//! mutex, and the new contents land via a temp file and rename so readers
//! never see a half-written document.

use std::collections::BTreeMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;
use validator::ValidationError;

use super::model::RadioProgram;

type Schedule = BTreeMap<String, Vec<RadioProgram>>;

pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RadioStoreError>> + Send + 'a>>;

/// Builds the new version of a program from the stored one.
pub type ProgramPatch<'a> =
    Box<dyn FnOnce(&RadioProgram) -> Result<RadioProgram, ValidationError> + Send + 'a>;

#[derive(Debug, thiserror::Error)]
pub enum RadioStoreError {
    #[error("Radio schedule I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Radio schedule file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(ValidationError),
}

pub trait RadioProgramStore: Send + Sync {
    fn list(&self, school_id: Uuid) -> StoreFuture<'_, Vec<RadioProgram>>;

    fn insert(&self, school_id: Uuid, program: RadioProgram) -> StoreFuture<'_, RadioProgram>;

    /// Patches program `id` while holding the write lock, so concurrent
    /// updates apply one after the other. `None` if there is no such program.
    fn update<'a>(
        &'a self,
        school_id: Uuid,
        id: &'a str,
        patch: ProgramPatch<'a>,
    ) -> StoreFuture<'a, Option<RadioProgram>>;

    /// Returns whether a program was removed.
    fn remove<'a>(&'a self, school_id: Uuid, id: &'a str) -> StoreFuture<'a, bool>;
}

pub struct FileRadioStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRadioStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Schedule, RadioStoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Schedule::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Schedule::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, schedule: &Schedule) -> Result<(), RadioStoreError> {
        let bytes = serde_json::to_vec_pretty(schedule)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Radio schedule written");
        Ok(())
    }
}

fn sort_by_start(programs: &mut [RadioProgram]) {
    programs.sort_by(|a, b| a.scheduled_for.cmp(&b.scheduled_for));
}

impl RadioProgramStore for FileRadioStore {
    fn list(&self, school_id: Uuid) -> StoreFuture<'_, Vec<RadioProgram>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut programs = self
                .read_all()
                .await?
                .remove(&school_id.to_string())
                .unwrap_or_default();
            sort_by_start(&mut programs);
            Ok(programs)
        })
    }

    fn insert(&self, school_id: Uuid, program: RadioProgram) -> StoreFuture<'_, RadioProgram> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut schedule = self.read_all().await?;
            let programs = schedule.entry(school_id.to_string()).or_default();
            programs.push(program.clone());
            sort_by_start(programs);
            self.write_all(&schedule).await?;
            Ok(program)
        })
    }

    fn update<'a>(
        &'a self,
        school_id: Uuid,
        id: &'a str,
        patch: ProgramPatch<'a>,
    ) -> StoreFuture<'a, Option<RadioProgram>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut schedule = self.read_all().await?;
            let Some(programs) = schedule.get_mut(&school_id.to_string()) else {
                return Ok(None);
            };
            let Some(slot) = programs.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            let mut program = patch(slot).map_err(RadioStoreError::Rejected)?;
            program.id = slot.id.clone();
            *slot = program.clone();
            sort_by_start(programs);
            self.write_all(&schedule).await?;
            Ok(Some(program))
        })
    }

    fn remove<'a>(&'a self, school_id: Uuid, id: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut schedule = self.read_all().await?;
            let key = school_id.to_string();
            let Some(programs) = schedule.get_mut(&key) else {
                return Ok(false);
            };
            let before = programs.len();
            programs.retain(|p| p.id != id);
            if programs.len() == before {
                return Ok(false);
            }
            if programs.is_empty() {
                schedule.remove(&key);
            }
            self.write_all(&schedule).await?;
            Ok(true)
        })
    }
}
