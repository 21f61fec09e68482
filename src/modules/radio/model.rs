use chrono::{DateTime, TimeDelta, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Older schedule files carry numeric ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// One scheduled slot, stored as-is in the schedule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RadioProgram {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub scheduled_for: DateTime<Utc>,
    pub duration_seconds: i64,
    /// Text read aloud when there is no audio file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// `audio`, `text`, or a MIME type such as `audio/mpeg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl RadioProgram {
    /// `None` when the end falls outside the representable calendar, which
    /// only a hand-edited schedule file can produce.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        TimeDelta::try_seconds(self.duration_seconds)
            .and_then(|d| self.scheduled_for.checked_add_signed(d))
    }

    /// Audio URL when the program plays a file rather than text.
    pub fn audio_url(&self) -> Option<&str> {
        let url = self.file_url.as_deref().filter(|u| !u.trim().is_empty())?;
        match self.file_type.as_deref() {
            None => Some(url),
            Some(t) if t == "audio" || t.starts_with("audio/") => Some(url),
            Some(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

fn validate_has_media(content: Option<&str>, file_url: Option<&str>) -> Result<(), ValidationError> {
    let has_content = content.is_some_and(|c| !c.trim().is_empty());
    let has_file = file_url.is_some_and(|u| !u.trim().is_empty());
    if !has_content && !has_file {
        let mut err = ValidationError::new("media_required");
        err.message = Some("Program needs text content or an audio file".into());
        return Err(err);
    }
    Ok(())
}

fn validate_create(dto: &CreateProgramDto) -> Result<(), ValidationError> {
    validate_has_media(dto.content.as_deref(), dto.file_url.as_deref())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_create"))]
pub struct CreateProgramDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    pub scheduled_for: DateTime<Utc>,
    #[validate(range(min = 1, max = 86400, message = "Duration must be between 1 second and 24 hours"))]
    pub duration_seconds: i64,
    pub content: Option<String>,
    #[validate(length(max = 2048, message = "File URL is too long"))]
    pub file_url: Option<String>,
    #[validate(length(max = 100, message = "File type is too long"))]
    pub file_type: Option<String>,
    pub school_id: Option<Uuid>,
}

impl CreateProgramDto {
    pub fn into_program(self) -> RadioProgram {
        RadioProgram {
            id: Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            scheduled_for: self.scheduled_for,
            duration_seconds: self.duration_seconds,
            content: self.content,
            file_url: self.file_url,
            file_type: self.file_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgramDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 86400, message = "Duration must be between 1 second and 24 hours"))]
    pub duration_seconds: Option<i64>,
    pub content: Option<String>,
    #[validate(length(max = 2048, message = "File URL is too long"))]
    pub file_url: Option<String>,
    #[validate(length(max = 100, message = "File type is too long"))]
    pub file_type: Option<String>,
}

impl UpdateProgramDto {
    /// Applies the patch, refusing a result with nothing to play.
    pub fn apply(self, program: &RadioProgram) -> Result<RadioProgram, ValidationError> {
        let updated = RadioProgram {
            id: program.id.clone(),
            title: self
                .title
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| program.title.clone()),
            scheduled_for: self.scheduled_for.unwrap_or(program.scheduled_for),
            duration_seconds: self.duration_seconds.unwrap_or(program.duration_seconds),
            content: self.content.or_else(|| program.content.clone()),
            file_url: self.file_url.or_else(|| program.file_url.clone()),
            file_type: self.file_type.or_else(|| program.file_type.clone()),
        };
        validate_has_media(updated.content.as_deref(), updated.file_url.as_deref())?;
        Ok(updated)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProgramQuery {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LiveQuery {
    /// Evaluate the schedule at this instant instead of now
    pub at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

/// How a client should start playing a live program.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum PlaybackPlan {
    #[serde(rename_all = "camelCase")]
    Audio { file_url: String, seek_seconds: i64 },
    /// Text split into utterance chunks. Playback starts at word
    /// `start_word` of chunk `start_chunk`; `start_chunk == chunks.len()`
    /// means the text has already been read out.
    #[serde(rename_all = "camelCase")]
    Speech {
        chunks: Vec<String>,
        start_chunk: usize,
        start_word: usize,
        words_per_second: f64,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveProgram {
    #[serde(flatten)]
    pub program: RadioProgram,
    pub current_offset: i64,
    pub remaining_seconds: i64,
    pub playback: Option<PlaybackPlan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(file_url: Option<&str>, file_type: Option<&str>, content: Option<&str>) -> RadioProgram {
        RadioProgram {
            id: "p1".to_string(),
            title: "Morning".to_string(),
            scheduled_for: Utc::now(),
            duration_seconds: 60,
            content: content.map(str::to_string),
            file_url: file_url.map(str::to_string),
            file_type: file_type.map(str::to_string),
        }
    }

    #[test]
    fn test_reads_legacy_numeric_ids_and_camel_case() {
        let json = r#"{"id":1704096000000,"title":"News","scheduledFor":"2024-01-01T08:00:00Z","durationSeconds":300,"content":"Hello"}"#;
        let p: RadioProgram = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, "1704096000000");
        assert_eq!(p.duration_seconds, 300);
        assert_eq!(p.text(), Some("Hello"));

        let out = serde_json::to_value(&p).unwrap();
        assert!(out.get("scheduledFor").is_some());
        assert!(out.get("fileUrl").is_none());
    }

    #[test]
    fn test_audio_url_respects_file_type() {
        assert_eq!(
            program(Some("/uploads/a.mp3"), Some("audio"), None).audio_url(),
            Some("/uploads/a.mp3")
        );
        assert!(program(Some("/uploads/a.mp3"), Some("audio/mpeg"), None).audio_url().is_some());
        assert!(program(Some("/uploads/a.mp3"), None, None).audio_url().is_some());
        assert!(program(Some("/uploads/a.pdf"), Some("text"), Some("x")).audio_url().is_none());
        assert!(program(Some("  "), Some("audio"), None).audio_url().is_none());
    }

    #[test]
    fn test_create_requires_media() {
        let dto = CreateProgramDto {
            title: "Quiet".to_string(),
            scheduled_for: Utc::now(),
            duration_seconds: 60,
            content: Some("   ".to_string()),
            file_url: None,
            file_type: None,
            school_id: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let original = program(None, Some("text"), Some("Read this"));
        let patch = UpdateProgramDto {
            title: Some(" Evening ".to_string()),
            scheduled_for: None,
            duration_seconds: Some(120),
            content: None,
            file_url: None,
            file_type: None,
        };
        let updated = patch.apply(&original).unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.title, "Evening");
        assert_eq!(updated.duration_seconds, 120);
        assert_eq!(updated.content, original.content);
    }

    #[test]
    fn test_ends_at_does_not_overflow() {
        let mut p = program(None, None, Some("x"));
        p.duration_seconds = 90;
        assert_eq!(p.ends_at(), Some(p.scheduled_for + TimeDelta::seconds(90)));

        p.duration_seconds = 10_000_000_000_000;
        assert_eq!(p.ends_at(), None);
        p.duration_seconds = i64::MAX;
        assert_eq!(p.ends_at(), None);
    }

    #[test]
    fn test_playback_plan_is_tagged() {
        let plan = PlaybackPlan::Audio {
            file_url: "/uploads/a.mp3".to_string(),
            seek_seconds: 42,
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["mode"], "audio");
        assert_eq!(json["seekSeconds"], 42);
    }
}
