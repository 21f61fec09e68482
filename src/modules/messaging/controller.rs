use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireBroadcastSend, RequireMessagesSend};
use crate::state::AppState;
use crate::utils::auth_helpers::school_for_scoped_operation;
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    BroadcastDto, BroadcastResult, ConversationDetail, ConversationSummary,
    CreateConversationDto, Message, MessageListParams, PaginatedMessagesResponse,
    SendMessageDto,
};
use super::service::MessagingService;

#[utoipa::path(
    get,
    path = "/api/messages/conversations",
    responses((status = 200, description = "Caller's conversations with unread counts", body = Vec<ConversationSummary>)),
    tag = "Messaging",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_conversations(
    State(state): State<AppState>,
    RequireMessagesSend(auth_user): RequireMessagesSend,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    Ok(Json(
        MessagingService::list_conversations(&state.db, auth_user.user_id()?).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/messages/conversations",
    request_body = CreateConversationDto,
    responses(
        (status = 201, description = "Conversation started", body = ConversationDetail),
        (status = 400, description = "Participant outside the school", body = ErrorResponse)
    ),
    tag = "Messaging",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_conversation(
    State(state): State<AppState>,
    RequireMessagesSend(auth_user): RequireMessagesSend,
    ValidatedJson(dto): ValidatedJson<CreateConversationDto>,
) -> Result<(StatusCode, Json<ConversationDetail>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let detail =
        MessagingService::create_conversation(&state.db, school_id, auth_user.user_id()?, dto)
            .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/messages/conversations/{id}",
    params(("id" = Uuid, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation with participants", body = ConversationDetail),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    ),
    tag = "Messaging",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_conversation(
    State(state): State<AppState>,
    RequireMessagesSend(auth_user): RequireMessagesSend,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationDetail>, AppError> {
    Ok(Json(
        MessagingService::get_conversation(&state.db, id, auth_user.user_id()?).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/messages/conversations/{id}/messages",
    params(("id" = Uuid, Path, description = "Conversation ID"), MessageListParams),
    responses(
        (status = 200, description = "Messages, oldest first", body = PaginatedMessagesResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    ),
    tag = "Messaging",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, params))]
pub async fn get_messages(
    State(state): State<AppState>,
    RequireMessagesSend(auth_user): RequireMessagesSend,
    Path(id): Path<Uuid>,
    ValidatedQuery(params): ValidatedQuery<MessageListParams>,
) -> Result<Json<PaginatedMessagesResponse>, AppError> {
    Ok(Json(
        MessagingService::list_messages(&state.db, id, auth_user.user_id()?, &params).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/messages/conversations/{id}/messages",
    params(("id" = Uuid, Path, description = "Conversation ID")),
    request_body = SendMessageDto,
    responses(
        (status = 201, description = "Message sent", body = Message),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    ),
    tag = "Messaging",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn send_message(
    State(state): State<AppState>,
    RequireMessagesSend(auth_user): RequireMessagesSend,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SendMessageDto>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = MessagingService::send_message(&state.db, id, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    post,
    path = "/api/messages/conversations/{id}/read",
    params(("id" = Uuid, Path, description = "Conversation ID")),
    responses(
        (status = 204, description = "Marked as read"),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    ),
    tag = "Messaging",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn mark_read(
    State(state): State<AppState>,
    RequireMessagesSend(auth_user): RequireMessagesSend,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    MessagingService::mark_read(&state.db, id, auth_user.user_id()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/messages/broadcast",
    request_body = BroadcastDto,
    responses(
        (status = 201, description = "Notice published and messages delivered", body = BroadcastResult),
        (status = 400, description = "Audience matched nobody", body = ErrorResponse),
        (status = 422, description = "No audience given", body = ErrorResponse)
    ),
    tag = "Messaging",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn broadcast(
    State(state): State<AppState>,
    RequireBroadcastSend(auth_user): RequireBroadcastSend,
    ValidatedJson(dto): ValidatedJson<BroadcastDto>,
) -> Result<(StatusCode, Json<BroadcastResult>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let result = MessagingService::broadcast(&state.db, school_id, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
