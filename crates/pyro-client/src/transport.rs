//! Shared request path for every sub-client: bearer auth, GET retry,
//! refresh-once on 401/403, error mapping, toasts, and the query cache.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::cache::{CacheTag, QueryCache};
use crate::error::ClientError;
use crate::notify::{Notifier, RequestOptions, Toast};
use crate::session::Session;

struct Inner {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

#[derive(Clone)]
pub(crate) struct Transport {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish()
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

impl Transport {
    pub(crate) fn new(
        http: reqwest::Client,
        mut base_url: Url,
        session: Session,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        // `Url::join` drops the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                session,
                cache: QueryCache::new(),
                notifier,
            }),
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn session(&self) -> &Session {
        &self.inner.session
    }

    pub(crate) fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub(crate) fn report(&self, err: &ClientError, options: RequestOptions) {
        if options.skip_notification {
            return;
        }
        self.inner.notifier.notify(Toast::error(err.user_message()));
    }

    fn url(&self, path: &str, endpoint: &str) -> Result<Url, ClientError> {
        self.inner.base_url.join(path).map_err(|e| {
            ClientError::Config(crate::config::ConfigError::InvalidUrl(
                endpoint.to_string(),
                e.to_string(),
            ))
        })
    }

    async fn send_once<B>(
        &self,
        method: &Method,
        url: &Url,
        endpoint: &str,
        build: &B,
    ) -> Result<Response, ClientError>
    where
        B: Fn(RequestBuilder) -> RequestBuilder,
    {
        let send = || {
            let mut request = self.inner.http.request(method.clone(), url.clone());
            if let Some(token) = self.inner.session.bearer() {
                request = request.bearer_auth(token.as_str());
            }
            build(request).send()
        };
        let result = if *method == Method::GET {
            crate::retry::retry_get(endpoint, send).await
        } else {
            send().await
        };
        result.map_err(|e| ClientError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }

    async fn execute_inner<B>(
        &self,
        method: Method,
        path: &str,
        endpoint: &str,
        build: B,
    ) -> Result<Response, ClientError>
    where
        B: Fn(RequestBuilder) -> RequestBuilder,
    {
        if !self.inner.session.is_valid() {
            return Err(ClientError::SessionExpired {
                endpoint: endpoint.to_string(),
            });
        }
        let url = self.url(path, endpoint)?;
        let mut resp = self.send_once(&method, &url, endpoint, &build).await?;

        if is_auth_failure(resp.status()) {
            tracing::debug!(endpoint, status = resp.status().as_u16(), "auth rejected, refreshing");
            if !self.inner.session.refresh().await {
                return Err(ClientError::SessionExpired {
                    endpoint: endpoint.to_string(),
                });
            }
            resp = self.send_once(&method, &url, endpoint, &build).await?;
        }

        let status = resp.status();
        tracing::debug!(endpoint, status = status.as_u16(), "portal API call");
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::from_response(
                endpoint.to_string(),
                status.as_u16(),
                body,
            ));
        }
        Ok(resp)
    }

    /// Send a request and return the successful response. Failures are
    /// reported to the notifier unless suppressed.
    pub(crate) async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        endpoint: &str,
        options: RequestOptions,
        build: B,
    ) -> Result<Response, ClientError>
    where
        B: Fn(RequestBuilder) -> RequestBuilder,
    {
        let result = self.execute_inner(method, path, endpoint, build).await;
        if let Err(e) = &result {
            self.report(e, options);
        }
        result
    }

    pub(crate) async fn decode<T: DeserializeOwned>(
        &self,
        resp: Response,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let result = resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint: endpoint.to_string(),
            source: e,
        });
        if let Err(e) = &result {
            self.report(e, options);
        }
        result
    }

    /// Typed JSON request.
    pub(crate) async fn json<T, B>(
        &self,
        method: Method,
        path: &str,
        endpoint: &str,
        options: RequestOptions,
        build: B,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Fn(RequestBuilder) -> RequestBuilder,
    {
        let resp = self.execute(method, path, endpoint, options, build).await?;
        self.decode(resp, endpoint, options).await
    }

    /// GET through the cache. `keep_unused_for == 0` bypasses it entirely.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn cached_get<T, Q>(
        &self,
        key: &str,
        path: &str,
        endpoint: &str,
        query: Option<&Q>,
        tags: Vec<CacheTag>,
        keep_unused_for: Duration,
        options: RequestOptions,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let generation = self.inner.session.generation();
        self.inner.cache.observe_generation(generation);
        if !keep_unused_for.is_zero() {
            if let Some(hit) = self.inner.cache.get::<T>(key) {
                tracing::trace!(key, "cache hit");
                return Ok(hit);
            }
        }
        let value: serde_json::Value = self
            .json(Method::GET, path, endpoint, options, |rb| match query {
                Some(q) => rb.query(q),
                None => rb,
            })
            .await?;
        let typed = serde_json::from_value::<T>(value.clone()).map_err(|e| {
            let err = ClientError::Shape {
                endpoint: endpoint.to_string(),
                source: e,
            };
            self.report(&err, options);
            err
        })?;
        // The identity changed while the request was in flight.
        if self.inner.session.generation() == generation {
            self.inner.cache.insert(key, value, tags, keep_unused_for);
        }
        Ok(typed)
    }

    pub(crate) fn invalidate(&self, tags: &[CacheTag]) {
        self.inner.cache.invalidate(tags);
    }
}
