use scholaris_core::{AppError, PaginationMeta};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::modules::classes::service::ClassService;
use crate::modules::notices::model::CreateNoticeDto;
use crate::modules::notices::service::NoticeService;

use super::model::{
    BroadcastDto, BroadcastResult, CONVERSATION_COLUMNS, Conversation, ConversationDetail,
    ConversationSummary, CreateConversationDto, MESSAGE_COLUMNS, Message, MessageListParams,
    PaginatedMessagesResponse, Participant, SendMessageDto,
};

pub struct MessagingService;

impl MessagingService {
    /// Creates the conversation, its participant rows and the first message.
    async fn open_conversation(
        conn: &mut PgConnection,
        school_id: Uuid,
        sender_id: Uuid,
        others: &[Uuid],
        subject: Option<&str>,
        body: &str,
    ) -> Result<(Conversation, Message), AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "INSERT INTO conversations (school_id, subject, created_by)
             VALUES ($1, $2, $3)
             RETURNING {CONVERSATION_COLUMNS}"
        ))
        .bind(school_id)
        .bind(subject)
        .bind(sender_id)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id, last_read_at)
             VALUES ($1, $2, NOW())",
        )
        .bind(conversation.id)
        .bind(sender_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id)
             SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(conversation.id)
        .bind(others)
        .execute(&mut *conn)
        .await?;

        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (conversation_id, sender_id, body)
             VALUES ($1, $2, $3)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(conversation.id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(&mut *conn)
        .await?;

        Ok((conversation, message))
    }

    #[instrument(skip(db, dto), fields(sender.id = %sender_id))]
    pub async fn create_conversation(
        db: &PgPool,
        school_id: Uuid,
        sender_id: Uuid,
        dto: CreateConversationDto,
    ) -> Result<ConversationDetail, AppError> {
        let others = dto.others(sender_id);
        if others.is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "A conversation needs at least one other participant"
            )));
        }

        let members = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE id = ANY($1) AND school_id = $2",
        )
        .bind(&others)
        .bind(school_id)
        .fetch_one(db)
        .await?;
        if members != others.len() as i64 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "All participants must belong to the same school"
            )));
        }

        let mut tx = db.begin().await?;
        let (conversation, _) = Self::open_conversation(
            &mut tx,
            school_id,
            sender_id,
            &others,
            dto.subject.as_deref().map(str::trim),
            &dto.body,
        )
        .await?;
        tx.commit().await?;

        info!(conversation.id = %conversation.id, participants = others.len() + 1, "Conversation started");
        Self::get_conversation(db, conversation.id, sender_id).await
    }

    pub async fn list_conversations(
        db: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, AppError> {
        let conversations = sqlx::query_as::<_, ConversationSummary>(
            "SELECT c.id, c.subject,
                    lm.body AS last_message,
                    lm.created_at AS last_message_at,
                    (SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id
                       AND m.sender_id IS DISTINCT FROM $1
                       AND m.created_at > COALESCE(p.last_read_at, '-infinity'::timestamptz)
                    ) AS unread_count,
                    c.updated_at
             FROM conversations c
             JOIN conversation_participants p ON p.conversation_id = c.id AND p.user_id = $1
             LEFT JOIN LATERAL (
                 SELECT body, created_at FROM messages
                 WHERE conversation_id = c.id
                 ORDER BY created_at DESC
                 LIMIT 1
             ) lm ON TRUE
             ORDER BY COALESCE(lm.created_at, c.created_at) DESC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(conversations)
    }

    /// Returns the conversation if `user_id` takes part in it. Non-participants
    /// get 404 so conversation ids cannot be discovered.
    async fn participant_conversation(
        db: &PgPool,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Conversation, AppError> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             WHERE id = $1
               AND EXISTS (SELECT 1 FROM conversation_participants
                           WHERE conversation_id = $1 AND user_id = $2)"
        ))
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Conversation not found")))
    }

    pub async fn get_conversation(
        db: &PgPool,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<ConversationDetail, AppError> {
        let conversation = Self::participant_conversation(db, conversation_id, user_id).await?;

        let participants = sqlx::query_as::<_, Participant>(
            "SELECT u.id AS user_id, u.first_name, u.last_name, u.role, p.last_read_at
             FROM conversation_participants p
             JOIN users u ON u.id = p.user_id
             WHERE p.conversation_id = $1
             ORDER BY u.last_name, u.first_name",
        )
        .bind(conversation.id)
        .fetch_all(db)
        .await?;

        Ok(ConversationDetail {
            conversation,
            participants,
        })
    }

    pub async fn list_messages(
        db: &PgPool,
        conversation_id: Uuid,
        user_id: Uuid,
        params: &MessageListParams,
    ) -> Result<PaginatedMessagesResponse, AppError> {
        let conversation = Self::participant_conversation(db, conversation_id, user_id).await?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation.id)
                .fetch_one(db)
                .await?;

        let data = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC
             LIMIT $2 OFFSET $3"
        ))
        .bind(conversation.id)
        .bind(params.pagination.limit())
        .bind(params.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedMessagesResponse {
            data,
            meta: PaginationMeta::new(total, &params.pagination),
        })
    }

    #[instrument(skip(db, dto))]
    pub async fn send_message(
        db: &PgPool,
        conversation_id: Uuid,
        sender_id: Uuid,
        dto: SendMessageDto,
    ) -> Result<Message, AppError> {
        let conversation = Self::participant_conversation(db, conversation_id, sender_id).await?;

        let mut tx = db.begin().await?;
        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (conversation_id, sender_id, body)
             VALUES ($1, $2, $3)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(conversation.id)
        .bind(sender_id)
        .bind(&dto.body)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(conversation.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE conversation_participants SET last_read_at = NOW()
             WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation.id)
        .bind(sender_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(message)
    }

    /// Moves the caller's read marker to now.
    pub async fn mark_read(db: &PgPool, conversation_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE conversation_participants SET last_read_at = NOW()
             WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Conversation not found")));
        }
        Ok(())
    }

    /// Publishes a notice and opens one conversation per recipient, all in
    /// one transaction.
    #[instrument(skip(db, dto), fields(audience.role = ?dto.audience_role, audience.class = ?dto.class_id))]
    pub async fn broadcast(
        db: &PgPool,
        school_id: Uuid,
        sender_id: Uuid,
        dto: BroadcastDto,
    ) -> Result<BroadcastResult, AppError> {
        if let Some(class_id) = dto.class_id {
            ClassService::get_class(db, class_id, Some(school_id))
                .await
                .map_err(|_| AppError::bad_request(anyhow::anyhow!("Class not found in this school")))?;
        }

        let recipients = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users
             WHERE school_id = $1
               AND id <> $2
               AND ($3::user_role IS NULL OR role = $3)
               AND ($4::uuid IS NULL
                    OR class_id = $4
                    OR id IN (SELECT parent_id FROM users
                              WHERE class_id = $4 AND parent_id IS NOT NULL))",
        )
        .bind(school_id)
        .bind(sender_id)
        .bind(dto.audience_role)
        .bind(dto.class_id)
        .fetch_all(db)
        .await?;

        if recipients.is_empty() {
            warn!("Broadcast matched no recipients");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "No users match the broadcast audience"
            )));
        }

        let notice_dto = CreateNoticeDto {
            title: dto.title.clone(),
            body: dto.body.clone(),
            audience_role: dto.audience_role,
            audience_class_id: dto.class_id,
            school_id: Some(school_id),
        };

        let mut tx = db.begin().await?;
        let notice = NoticeService::insert_notice(&mut tx, school_id, sender_id, &notice_dto).await?;
        for recipient in &recipients {
            Self::open_conversation(
                &mut tx,
                school_id,
                sender_id,
                std::slice::from_ref(recipient),
                Some(dto.title.trim()),
                &dto.body,
            )
            .await?;
        }
        tx.commit().await?;

        metrics::track_broadcast(recipients.len());
        info!(notice.id = %notice.id, recipients = recipients.len(), "Broadcast sent");

        Ok(BroadcastResult {
            notice,
            recipients: recipients.len(),
        })
    }
}
