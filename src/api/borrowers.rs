//! Borrower endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        borrower::{CreateBorrower, UpdateBorrower},
        BookTransaction, Borrower, PageQuery, RecordFilter,
    },
};

use super::{AuthenticatedUser, PaginatedResponse, ADMIN_ROLE};

/// Borrower listing query
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowerQuery {
    /// Case-insensitive match on first or last name
    pub name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// all, deleted or not_deleted (ignored when searching by name)
    pub filter: Option<RecordFilter>,
}

#[utoipa::path(
    get,
    path = "/borrowers",
    tag = "borrowers",
    params(BorrowerQuery),
    responses(
        (status = 200, description = "List of borrowers", body = PaginatedResponse<Borrower>)
    )
)]
pub async fn list_borrowers(
    State(state): State<crate::AppState>,
    Query(query): Query<BorrowerQuery>,
) -> AppResult<Json<PaginatedResponse<Borrower>>> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let (borrowers, total) = state
        .services
        .borrowers
        .list(
            query.name.as_deref(),
            query.filter.unwrap_or_default(),
            &page,
        )
        .await?;

    Ok(Json(PaginatedResponse::new(borrowers, total, &page)))
}

#[utoipa::path(
    get,
    path = "/borrowers/{reference}",
    tag = "borrowers",
    params(
        ("reference" = Uuid, Path, description = "Borrower reference")
    ),
    responses(
        (status = 200, description = "Borrower with loan history", body = Borrower),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower(
    State(state): State<crate::AppState>,
    Path(reference): Path<Uuid>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.get(reference).await?;
    Ok(Json(borrower))
}

/// Book transactions of a borrower, most recent first
#[utoipa::path(
    get,
    path = "/borrowers/{reference}/transactions",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Borrower reference")
    ),
    responses(
        (status = 200, description = "Borrower transactions", body = Vec<BookTransaction>),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn list_borrower_transactions(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<Json<Vec<BookTransaction>>> {
    let transactions = state.services.borrowers.transactions(reference).await?;
    Ok(Json(transactions))
}

#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower created", body = Borrower),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Borrower already exists")
    )
)]
pub async fn create_borrower(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Json(data): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    data.validate()?;

    let created = state.services.borrowers.create(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/borrowers/{reference}",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Borrower reference")
    ),
    request_body = UpdateBorrower,
    responses(
        (status = 200, description = "Borrower updated", body = Borrower),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn update_borrower(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
    Json(data): Json<UpdateBorrower>,
) -> AppResult<Json<Borrower>> {
    data.validate()?;

    let updated = state.services.borrowers.update(reference, data).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/borrowers/{reference}",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Borrower reference")
    ),
    responses(
        (status = 204, description = "Borrower deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Borrower not found"),
        (status = 409, description = "Borrower still has books on loan")
    )
)]
pub async fn delete_borrower(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_role(ADMIN_ROLE)?;

    state.services.borrowers.delete(reference).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/borrowers/{reference}/soft-delete",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(
        ("reference" = Uuid, Path, description = "Borrower reference")
    ),
    responses(
        (status = 204, description = "Borrower flagged as deleted"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn soft_delete_borrower(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(reference): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.borrowers.soft_delete(reference).await?;
    Ok(StatusCode::NO_CONTENT)
}
