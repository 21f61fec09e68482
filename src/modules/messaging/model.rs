use std::collections::HashSet;

use chrono::{DateTime, Utc};
use scholaris_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::modules::notices::model::Notice;
use crate::modules::users::model::UserRole;

pub const CONVERSATION_COLUMNS: &str = "id, school_id, subject, created_by, created_at, updated_at";
pub const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, body, created_at";

pub const MAX_PARTICIPANTS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Conversation {
    pub id: Uuid,
    pub school_id: Uuid,
    pub subject: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inbox row: a conversation plus its latest message and the caller's unread count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub subject: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participant {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateConversationDto {
    /// Other participants; the caller is always added
    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 participants are required"))]
    pub participant_ids: Vec<Uuid>,
    #[validate(length(max = 255, message = "Subject is at most 255 characters"))]
    pub subject: Option<String>,
    /// First message
    #[validate(length(min = 1, max = 10000, message = "Message body is required"))]
    pub body: String,
    pub school_id: Option<Uuid>,
}

impl CreateConversationDto {
    /// Participant ids without duplicates and without the sender.
    pub fn others(&self, sender_id: Uuid) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.participant_ids
            .iter()
            .copied()
            .filter(|id| *id != sender_id && seen.insert(*id))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendMessageDto {
    #[validate(length(min = 1, max = 10000, message = "Message body is required"))]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageListParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedMessagesResponse {
    pub data: Vec<Message>,
    pub meta: PaginationMeta,
}

fn validate_audience(dto: &BroadcastDto) -> Result<(), ValidationError> {
    if dto.audience_role.is_none() && dto.class_id.is_none() {
        let mut err = ValidationError::new("audience_required");
        err.message = Some("Broadcast needs an audience role, a class, or both".into());
        return Err(err);
    }
    if dto.audience_role == Some(UserRole::Admin) {
        let mut err = ValidationError::new("audience_role");
        err.message = Some("Cannot broadcast to system administrators".into());
        return Err(err);
    }
    Ok(())
}

/// Sends one message to every user matching the audience and records it as
/// a notice.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_audience"))]
pub struct BroadcastDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 10000, message = "Body is required"))]
    pub body: String,
    pub audience_role: Option<UserRole>,
    /// Students of this class and their parents
    pub class_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BroadcastResult {
    pub notice: Notice,
    pub recipients: usize,
}
