//! Typed client for the `users` and `roles` resources.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/users` | List accounts (admin) |
//! | GET    | `/users/{id}` | Get account |
//! | POST   | `/users/{id}` | Create account |
//! | PUT    | `/users/{id}` | Update profile |
//! | DELETE | `/users/{id}` | Deactivate (soft) |
//! | PUT    | `/roles` | Change an account's role |

use pyro_core::UserId;
use reqwest::Method;

use crate::cache::{CacheTag, DEFAULT_KEEP_UNUSED_FOR};
use crate::error::ClientError;
use crate::notify::RequestOptions;
use crate::transport::Transport;
use crate::types::{Account, Page, RoleChange, UserQuery};

#[derive(Debug, Clone)]
pub struct UserClient {
    transport: Transport,
}

impl UserClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn list(
        &self,
        query: &UserQuery,
        options: RequestOptions,
    ) -> Result<Page<Account>, ClientError> {
        let key = format!(
            "users?offset={}&limit={}&role={}",
            query.offset,
            query.limit,
            query.role.map(|r| r.as_str()).unwrap_or("")
        );
        self.transport
            .cached_get(
                &key,
                "users",
                "GET /users",
                Some(query),
                vec![CacheTag::UserList],
                DEFAULT_KEEP_UNUSED_FOR,
                options,
            )
            .await
    }

    pub async fn get(&self, id: &UserId, options: RequestOptions) -> Result<Account, ClientError> {
        self.transport
            .cached_get::<_, ()>(
                &format!("users/{id}"),
                &format!("users/{id}"),
                &format!("GET /users/{id}"),
                None,
                vec![CacheTag::Account(id.clone())],
                DEFAULT_KEEP_UNUSED_FOR,
                options,
            )
            .await
    }

    pub async fn create(&self, account: &Account) -> Result<Account, ClientError> {
        let id = &account.user_id;
        let result = self
            .transport
            .json(
                Method::POST,
                &format!("users/{id}"),
                &format!("POST /users/{id}"),
                RequestOptions::default(),
                |rb| rb.json(account),
            )
            .await;
        self.invalidate(id);
        result
    }

    /// The caller's account, created on first sign-in when the backend has
    /// no record yet.
    pub async fn ensure_account(&self, template: &Account) -> Result<Account, ClientError> {
        match self.get(&template.user_id, RequestOptions::silent()).await {
            Ok(account) => Ok(account),
            Err(e) if e.is_not_found() => {
                tracing::info!(user_id = %template.user_id, "creating account on first session");
                self.create(template).await
            }
            Err(e) => {
                self.transport.report(&e, RequestOptions::default());
                Err(e)
            }
        }
    }

    pub async fn update(&self, account: &Account) -> Result<Account, ClientError> {
        let id = &account.user_id;
        let result = self
            .transport
            .json(
                Method::PUT,
                &format!("users/{id}"),
                &format!("PUT /users/{id}"),
                RequestOptions::default(),
                |rb| rb.json(account),
            )
            .await;
        self.invalidate(id);
        result
    }

    /// Admin deactivation. The account remains readable with `Active = false`.
    pub async fn deactivate(&self, id: &UserId) -> Result<(), ClientError> {
        let result = self
            .transport
            .execute(
                Method::DELETE,
                &format!("users/{id}"),
                &format!("DELETE /users/{id}"),
                RequestOptions::default(),
                |rb| rb,
            )
            .await;
        self.invalidate(id);
        result.map(|_| ())
    }

    pub async fn change_role(&self, change: &RoleChange) -> Result<Account, ClientError> {
        let result = self
            .transport
            .json(
                Method::PUT,
                "roles",
                "PUT /roles",
                RequestOptions::default(),
                |rb| rb.json(change),
            )
            .await;
        if result.is_ok() {
            tracing::info!(user_id = %change.user_id, role = %change.role, "role changed");
        }
        self.invalidate(&change.user_id);
        // A new role changes which applications are visible.
        self.transport.invalidate(&[CacheTag::ApplicationList]);
        result
    }

    fn invalidate(&self, id: &UserId) {
        self.transport
            .invalidate(&[CacheTag::UserList, CacheTag::Account(id.clone())]);
    }
}
