use chrono::{DateTime, Utc};
use scholaris_core::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics;

use super::model::{CreateProgramDto, LiveProgram, RadioProgram, UpdateProgramDto};
use super::schedule::{Pacing, live_programs};
use super::store::{RadioProgramStore, RadioStoreError};

pub struct RadioService;

impl RadioService {
    pub async fn list_programs(
        store: &dyn RadioProgramStore,
        school_id: Uuid,
    ) -> Result<Vec<RadioProgram>, AppError> {
        Ok(store.list(school_id).await?)
    }

    #[instrument(skip(store, dto), fields(program.title = %dto.title))]
    pub async fn create_program(
        store: &dyn RadioProgramStore,
        school_id: Uuid,
        dto: CreateProgramDto,
    ) -> Result<RadioProgram, AppError> {
        let program = store.insert(school_id, dto.into_program()).await?;
        metrics::track_radio_program_write("create");
        info!(program.id = %program.id, "Radio program scheduled");
        Ok(program)
    }

    #[instrument(skip(store, dto))]
    pub async fn update_program(
        store: &dyn RadioProgramStore,
        school_id: Uuid,
        id: &str,
        dto: UpdateProgramDto,
    ) -> Result<RadioProgram, AppError> {
        let patch = Box::new(move |p: &RadioProgram| dto.apply(p));
        let program = match store.update(school_id, id, patch).await {
            Ok(Some(program)) => program,
            Ok(None) => return Err(AppError::not_found(anyhow::anyhow!("Radio program not found"))),
            Err(RadioStoreError::Rejected(e)) => return Err(AppError::unprocessable(e)),
            Err(e) => return Err(e.into()),
        };
        metrics::track_radio_program_write("update");
        Ok(program)
    }

    #[instrument(skip(store))]
    pub async fn delete_program(
        store: &dyn RadioProgramStore,
        school_id: Uuid,
        id: &str,
    ) -> Result<(), AppError> {
        if !store.remove(school_id, id).await? {
            return Err(AppError::not_found(anyhow::anyhow!("Radio program not found")));
        }
        metrics::track_radio_program_write("delete");
        Ok(())
    }

    pub async fn live(
        store: &dyn RadioProgramStore,
        school_id: Uuid,
        now: DateTime<Utc>,
        pacing: Pacing,
    ) -> Result<Vec<LiveProgram>, AppError> {
        let programs = store.list(school_id).await?;
        Ok(live_programs(&programs, now, pacing))
    }
}
