use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use service::pagination::Pagination;

use super::auth::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateDomainInput {
    #[serde(alias = "Name")]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DomainDetail {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub user_count: usize,
}

pub(crate) fn page(query: Result<Query<Pagination>, QueryRejection>) -> Result<Pagination, ApiError> {
    query.map(|Query(p)| p).map_err(|e| ApiError::BadRequest(e.body_text()))
}

#[utoipa::path(
    get, path = "/domain", tag = "domain",
    params(
        crate::openapi::PageParams
    ),
    responses(
        (status = 200, description = "Domain names", body = [String]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let page = page(query)?;
    let mut names = state.accounts.list_domains().await?;
    names.sort();
    Ok(Json(page.apply(names)))
}

#[utoipa::path(
    post, path = "/domain", tag = "domain", request_body = crate::openapi::CreateDomainRequest,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Invalid or existing domain"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreateDomainInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let domain = state.accounts.create_domain(&input.name).await?;
    info!(domain = %domain.name, event = "api_domain_created", "domain created via admin api");
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get, path = "/domain/{domain}", tag = "domain",
    params(
        ("domain" = String, Path, description = "Domain name")
    ),
    responses(
        (status = 200, description = "Domain detail", body = crate::openapi::DomainDetailDoc),
        (status = 400, description = "Not found or invalid"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Path(domain): Path<String>,
) -> Result<Json<DomainDetail>, ApiError> {
    let resolved = state.accounts.resolve_domain(&domain).await?;
    let users = state.accounts.domain_users(&domain).await?;
    Ok(Json(DomainDetail { name: resolved.name, created_at: resolved.created_at, user_count: users.len() }))
}

#[utoipa::path(
    delete, path = "/domain/{domain}", tag = "domain",
    params(
        ("domain" = String, Path, description = "Domain name")
    ),
    responses(
        (status = 200, description = "Deleted with all users"),
        (status = 400, description = "Not found"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(domain): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.accounts.delete_domain(&domain).await?;
    Ok(StatusCode::OK)
}
