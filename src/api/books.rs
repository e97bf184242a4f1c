//! Book catalog endpoints

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
        book::{CreateBook, UpdateBook},
        Book, ListQuery,
    },
};

use super::{AuthenticatedUser, PaginatedResponse, ADMIN_ROLE};

/// List books with soft-delete filter and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(ListQuery),
    responses(
        (status = 200, description = "List of books", body = PaginatedResponse<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let page = query.paging();
    let (books, total) = state
        .services
        .catalog
        .list_books(query.filter.unwrap_or_default(), &page)
        .await?;

    Ok(Json(PaginatedResponse::new(books, total, &page)))
}

/// Get book by reference
#[utoipa::path(
    get,
    path = "/books/{reference}",
    tag = "books",
    params(
        ("reference" = Uuid, Path, description = "Book reference")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(reference): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(reference).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Author or genre not found"),
        (status = 409, description = "A book with this title already exists")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Json(data): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    data.validate()?;

    let created = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{reference}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Book reference")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Title taken or copies changed concurrently")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
    Json(data): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    data.validate()?;

    let updated = state.services.catalog.update_book(reference, data).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{reference}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Book reference")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_role(ADMIN_ROLE)?;

    state.services.catalog.delete_book(reference).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flag a book as deleted
#[utoipa::path(
    put,
    path = "/books/{reference}/soft-delete",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Book reference")
    ),
    responses(
        (status = 204, description = "Book flagged as deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn soft_delete_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.catalog.soft_delete_book(reference).await?;
    Ok(StatusCode::NO_CONTENT)
}
