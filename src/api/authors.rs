//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        author::{CreateAuthor, UpdateAuthor},
        Author, Book, PageQuery,
    },
};

use super::{AuthenticatedUser, PaginatedResponse, ADMIN_ROLE};

#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "List of authors", body = PaginatedResponse<Author>)
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Author>>> {
    let (authors, total) = state.services.catalog.list_authors(&page).await?;
    Ok(Json(PaginatedResponse::new(authors, total, &page)))
}

#[utoipa::path(
    get,
    path = "/authors/{reference}",
    tag = "authors",
    params(
        ("reference" = Uuid, Path, description = "Author reference")
    ),
    responses(
        (status = 200, description = "Author details", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(reference): Path<Uuid>,
) -> AppResult<Json<Author>> {
    let author = state.services.catalog.get_author(reference).await?;
    Ok(Json(author))
}

/// Books written by an author
#[utoipa::path(
    get,
    path = "/authors/{reference}/books",
    tag = "authors",
    params(
        ("reference" = Uuid, Path, description = "Author reference"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Books by the author", body = PaginatedResponse<Book>),
        (status = 404, description = "Author not found")
    )
)]
pub async fn list_author_books(
    State(state): State<crate::AppState>,
    Path(reference): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let (books, total) = state
        .services
        .catalog
        .list_author_books(reference, &page)
        .await?;
    Ok(Json(PaginatedResponse::new(books, total, &page)))
}

#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Author already exists")
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Json(data): Json<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    data.validate()?;

    let created = state.services.catalog.create_author(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/authors/{reference}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Author reference")
    ),
    request_body = UpdateAuthor,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
    Json(data): Json<UpdateAuthor>,
) -> AppResult<Json<Author>> {
    data.validate()?;

    let updated = state.services.catalog.update_author(reference, data).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/authors/{reference}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Author reference")
    ),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_role(ADMIN_ROLE)?;

    state.services.catalog.delete_author(reference).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/authors/{reference}/soft-delete",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Author reference")
    ),
    responses(
        (status = 204, description = "Author flagged as deleted"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn soft_delete_author(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.catalog.soft_delete_author(reference).await?;
    Ok(StatusCode::NO_CONTENT)
}
