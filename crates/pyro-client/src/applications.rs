//! Typed client for the `applications` resource.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/applications` | List (1-based `offset`, `limit`, `status`, `type`) |
//! | POST   | `/applications` | Create (`save_draft=yes` for partial saves) |
//! | GET    | `/applications/{id}` | Get by ID |
//! | PUT    | `/applications/{id}` | Full update |
//! | DELETE | `/applications/{id}` | Soft delete |
//! | PUT    | `/applications/{id}/manage` | Approve / reject / mark in review |
//! | GET    | `/applications/metrics` | Dashboard counts (never cached) |
//!
//! Every mutation invalidates the list tag and the record's own tag.

use std::time::Duration;

use pyro_core::ApplicationId;
use reqwest::Method;

use crate::cache::{CacheTag, DEFAULT_KEEP_UNUSED_FOR};
use crate::error::ClientError;
use crate::notify::RequestOptions;
use crate::transport::Transport;
use crate::types::{Application, ApplicationMetrics, ApplicationQuery, ApplicationWrite, ManageRequest, Page};

/// Client for the applications resource.
#[derive(Debug, Clone)]
pub struct ApplicationClient {
    transport: Transport,
}

impl ApplicationClient {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// One page of applications visible to the caller.
    ///
    /// Identical queries are served from the cache until a mutation
    /// invalidates the list.
    pub async fn list(
        &self,
        query: &ApplicationQuery,
        options: RequestOptions,
    ) -> Result<Page<Application>, ClientError> {
        self.transport
            .cached_get(
                &query.cache_key(),
                "applications",
                "GET /applications",
                Some(query),
                vec![CacheTag::ApplicationList],
                DEFAULT_KEEP_UNUSED_FOR,
                options,
            )
            .await
    }

    pub async fn get(
        &self,
        id: &ApplicationId,
        options: RequestOptions,
    ) -> Result<Application, ClientError> {
        self.transport
            .cached_get::<_, ()>(
                &format!("applications/{id}"),
                &format!("applications/{id}"),
                &format!("GET /applications/{id}"),
                None,
                vec![CacheTag::Application(id.clone())],
                DEFAULT_KEEP_UNUSED_FOR,
                options,
            )
            .await
    }

    /// Create an application. `save_draft` keeps it at `draft`.
    pub async fn create(
        &self,
        body: &ApplicationWrite,
        save_draft: bool,
    ) -> Result<Application, ClientError> {
        let created: Application = self
            .transport
            .json(
                Method::POST,
                "applications",
                "POST /applications",
                RequestOptions::default(),
                |rb| {
                    let rb = rb.json(body);
                    if save_draft {
                        rb.query(&[("save_draft", "yes")])
                    } else {
                        rb
                    }
                },
            )
            .await?;
        tracing::info!(
            application_id = %created.application_id,
            status = %created.status,
            "application created"
        );
        self.transport.invalidate(&[CacheTag::ApplicationList]);
        Ok(created)
    }

    /// Replace an application's content. `save_draft` keeps a draft a draft.
    pub async fn update(
        &self,
        id: &ApplicationId,
        body: &ApplicationWrite,
        save_draft: bool,
    ) -> Result<Application, ClientError> {
        let endpoint = format!("PUT /applications/{id}");
        let result = self
            .transport
            .json(
                Method::PUT,
                &format!("applications/{id}"),
                &endpoint,
                RequestOptions::default(),
                |rb| {
                    let rb = rb.json(body);
                    if save_draft {
                        rb.query(&[("save_draft", "yes")])
                    } else {
                        rb
                    }
                },
            )
            .await;
        self.invalidate(id);
        result
    }

    /// Soft delete (withdraw).
    pub async fn delete(&self, id: &ApplicationId) -> Result<(), ClientError> {
        let result = self
            .transport
            .execute(
                Method::DELETE,
                &format!("applications/{id}"),
                &format!("DELETE /applications/{id}"),
                RequestOptions::default(),
                |rb| rb,
            )
            .await;
        self.invalidate(id);
        result.map(|_| ())
    }

    /// Approve, reject, or mark in review.
    pub async fn manage(
        &self,
        id: &ApplicationId,
        request: &ManageRequest,
    ) -> Result<Application, ClientError> {
        let result: Result<Application, _> = self
            .transport
            .json(
                Method::PUT,
                &format!("applications/{id}/manage"),
                &format!("PUT /applications/{id}/manage"),
                RequestOptions::default(),
                |rb| rb.json(request),
            )
            .await;
        if let Ok(app) = &result {
            tracing::info!(
                application_id = %id,
                action = %request.action,
                status = %app.status,
                "application managed"
            );
        }
        self.invalidate(id);
        result
    }

    /// Live dashboard counts.
    pub async fn metrics(&self, options: RequestOptions) -> Result<ApplicationMetrics, ClientError> {
        self.transport
            .cached_get::<_, ()>(
                "applications/metrics",
                "applications/metrics",
                "GET /applications/metrics",
                None,
                vec![],
                Duration::ZERO,
                options,
            )
            .await
    }

    fn invalidate(&self, id: &ApplicationId) {
        self.transport.invalidate(&[
            CacheTag::ApplicationList,
            CacheTag::Application(id.clone()),
        ]);
    }
}
