use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireLibraryRead, RequireLibraryWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    Book, BookFilterParams, BookIssue, CreateBookDto, IssueBookDto, IssueFilterParams,
    PaginatedBooksResponse, ReturnBookDto, UpdateBookDto,
};
use super::service::LibraryService;

#[utoipa::path(
    post,
    path = "/api/library/books",
    request_body = CreateBookDto,
    responses((status = 201, description = "Book added", body = Book)),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_book(
    State(state): State<AppState>,
    RequireLibraryWrite(auth_user): RequireLibraryWrite,
    ValidatedJson(dto): ValidatedJson<CreateBookDto>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let book = LibraryService::create_book(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    get,
    path = "/api/library/books",
    params(BookFilterParams),
    responses((status = 200, description = "Paginated books", body = PaginatedBooksResponse)),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_books(
    State(state): State<AppState>,
    RequireLibraryRead(auth_user): RequireLibraryRead,
    ValidatedQuery(filters): ValidatedQuery<BookFilterParams>,
) -> Result<Json<PaginatedBooksResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(LibraryService::list_books(&state.db, school_id, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/library/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_book(
    State(state): State<AppState>,
    RequireLibraryRead(auth_user): RequireLibraryRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(LibraryService::get_book(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/library/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBookDto,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 409, description = "Total below copies on loan", body = ErrorResponse)
    ),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_book(
    State(state): State<AppState>,
    RequireLibraryWrite(auth_user): RequireLibraryWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateBookDto>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(
        LibraryService::update_book(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/library/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 409, description = "Copies still on loan", body = ErrorResponse)
    ),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_book(
    State(state): State<AppState>,
    RequireLibraryWrite(auth_user): RequireLibraryWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    LibraryService::delete_book(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/library/issues",
    request_body = IssueBookDto,
    responses(
        (status = 201, description = "Book issued", body = BookIssue),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "No copies available", body = ErrorResponse)
    ),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn issue_book(
    State(state): State<AppState>,
    RequireLibraryWrite(auth_user): RequireLibraryWrite,
    ValidatedJson(dto): ValidatedJson<IssueBookDto>,
) -> Result<(StatusCode, Json<BookIssue>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, None)?;
    let issue =
        LibraryService::issue_book(&state.db, school_id, &state.library_config, dto).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

#[utoipa::path(
    post,
    path = "/api/library/issues/{id}/return",
    params(("id" = Uuid, Path, description = "Issue ID")),
    request_body(content = ReturnBookDto, description = "Optional; defaults to returning today"),
    responses(
        (status = 200, description = "Book returned with any overdue fine", body = BookIssue),
        (status = 409, description = "Already returned", body = ErrorResponse)
    ),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, body))]
pub async fn return_book(
    State(state): State<AppState>,
    RequireLibraryWrite(auth_user): RequireLibraryWrite,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<BookIssue>, AppError> {
    let dto = if body.iter().all(u8::is_ascii_whitespace) {
        ReturnBookDto::default()
    } else {
        serde_json::from_slice::<ReturnBookDto>(&body)
            .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid JSON: {e}")))?
    };
    dto.validate().map_err(AppError::unprocessable)?;

    let issue = LibraryService::return_book(
        &state.db,
        id,
        resource_scope(&auth_user)?,
        &state.library_config,
        dto,
    )
    .await?;
    Ok(Json(issue))
}

#[utoipa::path(
    get,
    path = "/api/library/issues",
    params(IssueFilterParams),
    responses((status = 200, description = "Book issues; students see only their own", body = Vec<BookIssue>)),
    tag = "Library",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_issues(
    State(state): State<AppState>,
    RequireLibraryRead(auth_user): RequireLibraryRead,
    ValidatedQuery(mut filters): ValidatedQuery<IssueFilterParams>,
) -> Result<Json<Vec<BookIssue>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    if !auth_user.has_permission(scholaris_core::permissions::LIBRARY_WRITE) {
        filters.user_id = Some(auth_user.user_id()?);
    }
    Ok(Json(LibraryService::list_issues(&state.db, school_id, &filters).await?))
}
