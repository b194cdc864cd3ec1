use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use service::accounts::User;
use service::pagination::Pagination;

use super::{auth::ServerState, domains::page};
use crate::errors::ApiError;

#[derive(Deserialize)]
pub struct CreateUserInput {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AliasInput {
    #[serde(alias = "Alias")]
    pub alias: String,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(v)| v).map_err(|e| ApiError::BadRequest(e.body_text()))
}

#[utoipa::path(
    get, path = "/domain/{domain}/user", tag = "user",
    params(
        ("domain" = String, Path, description = "Domain name"),
        crate::openapi::PageParams
    ),
    responses(
        (status = 200, description = "Users without credential material", body = [crate::openapi::UserDoc]),
        (status = 400, description = "Unknown domain"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Path(domain): Path<String>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let page = page(query)?;
    let mut users = state.accounts.domain_users(&domain).await?;
    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(Json(page.apply(users)))
}

#[utoipa::path(
    post, path = "/domain/{domain}/user", tag = "user",
    params(
        ("domain" = String, Path, description = "Domain name")
    ),
    request_body = crate::openapi::CreateUserRequest,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Invalid or existing user"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Path(domain): Path<String>,
    payload: Result<Json<CreateUserInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let input = body(payload)?;
    state.accounts.create_user(&domain, &input.username, &input.password).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    delete, path = "/domain/{domain}/user/{user}", tag = "user",
    params(
        ("domain" = String, Path, description = "Domain name"),
        ("user" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Not found"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path((domain, user)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.accounts.delete_user(&domain, &user).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post, path = "/domain/{domain}/user/{user}/alias", tag = "user",
    params(
        ("domain" = String, Path, description = "Domain name"),
        ("user" = String, Path, description = "Username")
    ),
    request_body = crate::openapi::AliasRequest,
    responses(
        (status = 200, description = "Updated user", body = crate::openapi::UserDoc),
        (status = 400, description = "Invalid, taken or unknown"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn add_alias(
    State(state): State<ServerState>,
    Path((domain, user)): Path<(String, String)>,
    payload: Result<Json<AliasInput>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let input = body(payload)?;
    Ok(Json(state.accounts.add_alias(&domain, &user, &input.alias).await?))
}

#[utoipa::path(
    delete, path = "/domain/{domain}/user/{user}/alias/{alias}", tag = "user",
    params(
        ("domain" = String, Path, description = "Domain name"),
        ("user" = String, Path, description = "Username"),
        ("alias" = String, Path, description = "Alias, local part or full address")
    ),
    responses(
        (status = 200, description = "Updated user", body = crate::openapi::UserDoc),
        (status = 400, description = "Unknown alias"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn remove_alias(
    State(state): State<ServerState>,
    Path((domain, user, alias)): Path<(String, String, String)>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.accounts.remove_alias(&domain, &user, &alias).await?))
}
