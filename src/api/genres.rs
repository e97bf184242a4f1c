//! Genre endpoints

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
        genre::{CreateGenre, UpdateGenre},
        Book, Genre, PageQuery,
    },
};

use super::{AuthenticatedUser, PaginatedResponse, ADMIN_ROLE};

#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    params(PageQuery),
    responses(
        (status = 200, description = "List of genres", body = PaginatedResponse<Genre>)
    )
)]
pub async fn list_genres(
    State(state): State<crate::AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Genre>>> {
    let (genres, total) = state.services.catalog.list_genres(&page).await?;
    Ok(Json(PaginatedResponse::new(genres, total, &page)))
}

#[utoipa::path(
    get,
    path = "/genres/{reference}",
    tag = "genres",
    params(
        ("reference" = Uuid, Path, description = "Genre reference")
    ),
    responses(
        (status = 200, description = "Genre details", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<crate::AppState>,
    Path(reference): Path<Uuid>,
) -> AppResult<Json<Genre>> {
    let genre = state.services.catalog.get_genre(reference).await?;
    Ok(Json(genre))
}

/// Books filed under a genre
#[utoipa::path(
    get,
    path = "/genres/{reference}/books",
    tag = "genres",
    params(
        ("reference" = Uuid, Path, description = "Genre reference"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Books in the genre", body = PaginatedResponse<Book>),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn list_genre_books(
    State(state): State<crate::AppState>,
    Path(reference): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let (books, total) = state
        .services
        .catalog
        .list_genre_books(reference, &page)
        .await?;
    Ok(Json(PaginatedResponse::new(books, total, &page)))
}

#[utoipa::path(
    post,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = CreateGenre,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Genre already exists")
    )
)]
pub async fn create_genre(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Json(data): Json<CreateGenre>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    data.validate()?;

    let created = state.services.catalog.create_genre(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/genres/{reference}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Genre reference")
    ),
    request_body = UpdateGenre,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn update_genre(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
    Json(data): Json<UpdateGenre>,
) -> AppResult<Json<Genre>> {
    data.validate()?;

    let updated = state.services.catalog.update_genre(reference, data).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/genres/{reference}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Genre reference")
    ),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_role(ADMIN_ROLE)?;

    state.services.catalog.delete_genre(reference).await?;
    Ok(StatusCode::NO_CONTENT)
}
