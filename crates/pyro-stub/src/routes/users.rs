//! # Users and Roles
//!
//! Accounts create themselves on first sign-in (`POST /users/:id` with the
//! caller's own id) and always start as applicants. Only admins list
//! accounts, change roles, or deactivate. Deactivation is soft: the record
//! stays readable with `Active = false` and its token stops working.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use pyro_client::{Account, Page, RoleChange};
use pyro_core::{Action, Role, Service, UserId};
use serde::Deserialize;

use crate::auth::{Bearer, Caller};
use crate::error::{extract_json, AppError};
use crate::routes::{default_offset, extract_query, paginate};
use crate::store::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user)
                .post(create_user)
                .put(update_user)
                .delete(deactivate_user),
        )
        .route("/roles", put(change_role))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default = "default_offset")]
    offset: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    role: Option<Role>,
}

fn default_limit() -> u32 {
    25
}

fn require_self_or_admin(caller: &Caller, id: &UserId) -> Result<(), AppError> {
    if caller.id() == id {
        Ok(())
    } else {
        caller.require_admin()
    }
}

fn find(state: &AppState, id: &UserId) -> Result<Account, AppError> {
    state
        .users()
        .get(id)
        .map(|a| a.value().clone())
        .ok_or_else(|| AppError::not_found(format!("user {id}")))
}

async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> Result<Json<Page<Account>>, AppError> {
    let query = extract_query(query)?;
    caller.require_admin()?;
    let mut accounts: Vec<Account> = state
        .users()
        .iter()
        .map(|a| a.value().clone())
        .filter(|a| query.role.map_or(true, |r| a.current_role == r))
        .collect();
    accounts.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    Ok(Json(paginate(accounts, query.offset, query.limit)?))
}

async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<UserId>,
) -> Result<Json<Account>, AppError> {
    caller.require(&state, Service::Users, Action::View)?;
    require_self_or_admin(&caller, &id)?;
    Ok(Json(find(&state, &id)?))
}

async fn create_user(
    State(state): State<AppState>,
    Bearer(token_user): Bearer,
    Path(id): Path<UserId>,
    body: Result<Json<Account>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let mut account = extract_json(body)?;
    let by_admin = state
        .users()
        .get(&token_user)
        .map_or(false, |a| a.active && a.current_role == Role::Admin);
    if token_user != id && !by_admin {
        return Err(AppError::Forbidden(format!(
            "'{token_user}' may not create an account for '{id}'"
        )));
    }

    account.user_id = id.clone();
    account.active = true;
    if !by_admin {
        account.current_role = Role::User;
    }
    match state.users().entry(id.clone()) {
        dashmap::mapref::entry::Entry::Occupied(_) => {
            Err(AppError::Conflict(format!("user {id} already exists")))
        }
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(account.clone());
            tracing::info!(user_id = %id, role = %account.current_role, "account created");
            Ok((StatusCode::CREATED, Json(account)))
        }
    }
}

async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<UserId>,
    body: Result<Json<Account>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let mut account = extract_json(body)?;
    caller.require(&state, Service::Users, Action::Edit)?;
    require_self_or_admin(&caller, &id)?;

    let mut stored = state
        .users()
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found(format!("user {id}")))?;
    // Role and activation only change through their own endpoints.
    account.user_id = id;
    account.current_role = stored.current_role;
    account.active = stored.active;
    *stored = account.clone();
    Ok(Json(account))
}

async fn deactivate_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    caller.require(&state, Service::Users, Action::Delete)?;
    if caller.id() == &id {
        return Err(AppError::Conflict("an account cannot deactivate itself".into()));
    }
    let mut stored = state
        .users()
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found(format!("user {id}")))?;
    stored.active = false;
    tracing::info!(user_id = %id, by = %caller.id(), "account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

async fn change_role(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<RoleChange>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let change = extract_json(body)?;
    caller.require_admin()?;
    let mut stored = state
        .users()
        .get_mut(&change.user_id)
        .ok_or_else(|| AppError::not_found(format!("user {}", change.user_id)))?;
    stored.current_role = change.role;
    tracing::info!(user_id = %change.user_id, role = %change.role, by = %caller.id(), "role changed");
    Ok(Json(stored.clone()))
}
