//! # Documents
//!
//! The stub plays object storage too: a presign answers with an upload URL
//! on the stub itself, and a signed read URL serves the stored bytes.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | POST   | `/documents` | bearer; `documents:create` |
//! | GET    | `/documents?DocumentType&ApplicationId` | bearer; `documents:view` |
//! | DELETE | `/documents?DocumentType&ApplicationId` | bearer; `documents:delete` |
//! | PUT    | `/uploads/*key?signature=` | presigned signature only |
//! | GET    | `/files/*key?signature=` | signed signature only |
//!
//! Documents presigned without an `ApplicationId` are held per account and
//! attach to the next application that account creates.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Duration;
use pyro_client::{DocumentQuery, PresignRequest, PresignedUpload, SignedUrl, UploadedFile};
use pyro_core::{Action, Service, Timestamp};
use pyro_state::ensure_editable;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::{extract_json, AppError};
use crate::routes::applications::with_application;
use crate::routes::extract_query;
use crate::store::{AppState, PendingUpload, ReadGrant, StoredObject};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

const UPLOAD_URL_TTL_MINUTES: i64 = 15;
const READ_URL_TTL_MINUTES: i64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/documents",
            post(presign).get(signed_url).delete(delete_document),
        )
        .route(
            "/uploads/*key",
            put(receive_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/files/*key", get(serve_file))
}

#[derive(Debug, Deserialize)]
pub struct SignatureQuery {
    signature: String,
}

/// Storage-safe rendition of a user-supplied file name.
fn object_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The last path segment, trimmed.
fn display_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim()
}

fn expiry(minutes: i64) -> Timestamp {
    Timestamp::from_utc(*Timestamp::now().as_datetime() + Duration::minutes(minutes))
}

/// The stored descriptor for `query`, resolving against the application
/// when one is named and the caller's own holdings otherwise.
fn lookup(state: &AppState, caller: &Caller, query: &DocumentQuery) -> Result<UploadedFile, AppError> {
    let missing = || AppError::not_found(format!("{} document", query.document_type.label()));
    match &query.application_id {
        Some(id) => with_application(state, caller, id, |app| {
            app.record
                .documents_uploaded
                .get(&query.document_type)
                .cloned()
                .ok_or_else(missing)
        }),
        None => state
            .user_documents()
            .get(&(caller.id().clone(), query.document_type))
            .map(|f| f.value().clone())
            .ok_or_else(missing),
    }
}

async fn presign(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<PresignRequest>, JsonRejection>,
) -> Result<Json<PresignedUpload>, AppError> {
    let body = extract_json(body)?;
    caller.require(&state, Service::Documents, Action::Create)?;
    state.purge_expired_grants(Timestamp::now());

    let file_name = display_name(&body.file_name).to_string();
    if file_name.is_empty() {
        return Err(AppError::Validation("FileName is required".into()));
    }
    let scope = match &body.application_id {
        Some(id) => {
            with_application(&state, &caller, id, |_| Ok(()))?;
            id.to_string()
        }
        None => format!("users/{}", caller.id()),
    };
    let key = format!("{scope}/{}/{}", body.document_type, object_name(&file_name));
    let signature = Uuid::new_v4().simple().to_string();
    let expires_at = expiry(UPLOAD_URL_TTL_MINUTES);

    state.pending_uploads().insert(
        signature.clone(),
        PendingUpload {
            key: key.clone(),
            document_type: body.document_type,
            file_name,
            owner: caller.id().clone(),
            application_id: body.application_id.clone(),
            expires_at,
        },
    );
    tracing::debug!(%key, "upload presigned");
    Ok(Json(PresignedUpload {
        upload_url: format!("{}/uploads/{key}?signature={signature}", state.public_url()),
        key,
        expires_at,
    }))
}

async fn receive_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: Result<Query<SignatureQuery>, QueryRejection>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Result<StatusCode, AppError> {
    let query = extract_query(query)?;
    let (_, pending) = state
        .pending_uploads()
        .remove(&query.signature)
        .ok_or_else(|| AppError::Forbidden("upload signature does not match".into()))?;
    if pending.key != key {
        return Err(AppError::Forbidden("upload signature does not match".into()));
    }
    if pending.expires_at < Timestamp::now() {
        return Err(AppError::Forbidden("upload URL has expired".into()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let file = UploadedFile {
        upload_date: Timestamp::now(),
        size: bytes.len() as u64,
        path: key.clone(),
        file_name: pending.file_name.clone(),
    };
    let object = StoredObject {
        bytes: bytes.to_vec(),
        content_type,
    };

    // Bytes are stored only once there is a descriptor to point at them.
    match &pending.application_id {
        Some(id) => {
            let mut app = state
                .applications()
                .get_mut(id)
                .ok_or_else(|| AppError::not_found(format!("application {id}")))?;
            state.objects().insert(key.clone(), object);
            if let Some(previous) = app.record.documents_uploaded.insert(pending.document_type, file) {
                if previous.path != key {
                    state.objects().remove(&previous.path);
                }
            }
        }
        None => {
            state.objects().insert(key.clone(), object);
            state
                .user_documents()
                .insert((pending.owner.clone(), pending.document_type), file);
        }
    }
    tracing::info!(%key, bytes = bytes.len(), owner = %pending.owner, "document stored");
    Ok(StatusCode::OK)
}

async fn signed_url(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> Result<Json<SignedUrl>, AppError> {
    let query = extract_query(query)?;
    caller.require(&state, Service::Documents, Action::View)?;
    let file = lookup(&state, &caller, &query)?;
    state.purge_expired_grants(Timestamp::now());

    let signature = Uuid::new_v4().simple().to_string();
    let expires_at = expiry(READ_URL_TTL_MINUTES);
    state.read_grants().insert(
        signature.clone(),
        ReadGrant {
            key: file.path.clone(),
            expires_at,
        },
    );
    Ok(Json(SignedUrl {
        url: format!("{}/files/{}?signature={signature}", state.public_url(), file.path),
        file_name: file.file_name,
        expires_at,
    }))
}

async fn serve_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: Result<Query<SignatureQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = extract_query(query)?;
    let refused = || AppError::Forbidden("read signature is invalid or expired".into());
    let grant = state
        .read_grants()
        .get(&query.signature)
        .map(|g| g.value().clone())
        .ok_or_else(refused)?;
    if grant.expires_at < Timestamp::now() {
        state.read_grants().remove(&query.signature);
        return Err(refused());
    }
    if grant.key != key {
        return Err(refused());
    }
    let object = state
        .objects()
        .get(&grant.key)
        .map(|o| o.value().clone())
        .ok_or_else(|| AppError::not_found(format!("object {key}")))?;
    Ok(([(header::CONTENT_TYPE, object.content_type)], object.bytes).into_response())
}

async fn delete_document(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let query = extract_query(query)?;
    caller.require(&state, Service::Documents, Action::Delete)?;

    let removed = match &query.application_id {
        Some(id) => with_application(&state, &caller, id, |app| {
            ensure_editable(app.record.status)?;
            Ok(app.record.documents_uploaded.remove(&query.document_type))
        })?,
        None => state
            .user_documents()
            .remove(&(caller.id().clone(), query.document_type))
            .map(|(_, f)| f),
    };
    let file = removed
        .ok_or_else(|| AppError::not_found(format!("{} document", query.document_type.label())))?;
    state.objects().remove(&file.path);
    tracing::info!(key = %file.path, by = %caller.id(), "document deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StubConfig;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use pyro_client::Account;
    use pyro_core::{ApplicationId, DocumentType, UserId};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn setup() -> (AppState, Router) {
        let state = AppState::new(StubConfig::new("http://stub.test"));
        state.put_account(Account::new_applicant(UserId::new("u1").unwrap(), "u1@example.com"));
        state.put_account(Account::new_applicant(UserId::new("u2").unwrap(), "u2@example.com"));
        let app = router().with_state(state.clone());
        (state, app)
    }

    async fn body_bytes(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn body_json(resp: Response) -> Value {
        serde_json::from_slice(&body_bytes(resp).await).unwrap()
    }

    fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json");
        builder
            .body(body.map(|v| Body::from(v.to_string())).unwrap_or_else(Body::empty))
            .unwrap()
    }

    /// The path-and-query part of a URL on `http://stub.test`.
    fn local(url: &str) -> &str {
        url.strip_prefix("http://stub.test").unwrap()
    }

    async fn presign_and_upload(app: &Router, token: &str, name: &str, bytes: &[u8]) -> Value {
        let resp = app
            .clone()
            .oneshot(authed(
                "POST",
                "/documents",
                token,
                Some(json!({"DocumentType": "site_plan", "FileName": name})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let presigned = body_json(resp).await;
        let upload = Request::builder()
            .method("PUT")
            .uri(local(presigned["UploadUrl"].as_str().unwrap()))
            .header("content-type", "application/pdf")
            .body(Body::from(bytes.to_vec()))
            .unwrap();
        let resp = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        presigned
    }

    #[tokio::test]
    async fn upload_then_read_back_through_signed_url() {
        let (_, app) = setup();
        let presigned = presign_and_upload(&app, "u1", "C:\\scans\\site plan.pdf", b"%PDF-1.7").await;
        assert_eq!(presigned["Key"], "users/u1/site_plan/site_plan.pdf");

        let resp = app
            .clone()
            .oneshot(authed("GET", "/documents?DocumentType=site_plan", "u1", None))
            .await
            .unwrap();
        let signed = body_json(resp).await;
        assert_eq!(signed["FileName"], "site plan.pdf");

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(local(signed["Url"].as_str().unwrap()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(body_bytes(resp).await, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn presigned_url_is_single_use() {
        let (_, app) = setup();
        let presigned = presign_and_upload(&app, "u1", "plan.pdf", b"one").await;
        let replay = Request::builder()
            .method("PUT")
            .uri(local(presigned["UploadUrl"].as_str().unwrap()))
            .body(Body::from("two"))
            .unwrap();
        let resp = app.clone().oneshot(replay).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn documents_are_private_to_their_owner() {
        let (_, app) = setup();
        presign_and_upload(&app, "u1", "plan.pdf", b"x").await;
        let resp = app
            .clone()
            .oneshot(authed("GET", "/documents?DocumentType=site_plan", "u2", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_descriptor_and_bytes() {
        let (state, app) = setup();
        let presigned = presign_and_upload(&app, "u1", "plan.pdf", b"x").await;
        let resp = app
            .clone()
            .oneshot(authed("DELETE", "/documents?DocumentType=site_plan", "u1", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(state.objects().get(presigned["Key"].as_str().unwrap()).is_none());

        let resp = app
            .clone()
            .oneshot(authed("DELETE", "/documents?DocumentType=site_plan", "u1", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn expired_grants_are_dropped_on_the_next_presign() {
        let (state, app) = setup();
        let long_ago = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
        state.pending_uploads().insert(
            "stale-upload".into(),
            PendingUpload {
                key: "users/u1/site_plan/old.pdf".into(),
                document_type: DocumentType::SitePlan,
                file_name: "old.pdf".into(),
                owner: UserId::new("u1").unwrap(),
                application_id: None,
                expires_at: long_ago,
            },
        );
        state.read_grants().insert(
            "stale-read".into(),
            ReadGrant {
                key: "users/u1/site_plan/old.pdf".into(),
                expires_at: long_ago,
            },
        );

        presign_and_upload(&app, "u1", "plan.pdf", b"x").await;
        assert!(state.pending_uploads().get("stale-upload").is_none());
        assert!(state.read_grants().get("stale-read").is_none());
        assert!(state.pending_uploads().is_empty(), "the used upload is consumed too");
    }

    #[tokio::test]
    async fn expired_read_grant_is_refused_and_forgotten() {
        let (state, app) = setup();
        let presigned = presign_and_upload(&app, "u1", "plan.pdf", b"x").await;
        let key = presigned["Key"].as_str().unwrap().to_string();
        state.read_grants().insert(
            "old".into(),
            ReadGrant {
                key: key.clone(),
                expires_at: Timestamp::parse("2020-01-01T00:00:00Z").unwrap(),
            },
        );

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/files/{key}?signature=old"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(state.read_grants().get("old").is_none());
    }

    #[tokio::test]
    async fn upload_for_a_vanished_application_stores_nothing() {
        let (state, app) = setup();
        let key = "app-gone/site_plan/plan.pdf".to_string();
        state.pending_uploads().insert(
            "sig".into(),
            PendingUpload {
                key: key.clone(),
                document_type: DocumentType::SitePlan,
                file_name: "plan.pdf".into(),
                owner: UserId::new("u1").unwrap(),
                application_id: Some(ApplicationId::new("app-gone").unwrap()),
                expires_at: expiry(UPLOAD_URL_TTL_MINUTES),
            },
        );

        let upload = Request::builder()
            .method("PUT")
            .uri(format!("/uploads/{key}?signature=sig"))
            .body(Body::from("bytes"))
            .unwrap();
        let resp = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(state.objects().is_empty());
    }

    #[test]
    fn file_names_are_reduced_to_their_last_segment() {
        assert_eq!(display_name("/tmp/a/check.pdf"), "check.pdf");
        assert_eq!(display_name(" check.pdf "), "check.pdf");
        assert_eq!(object_name("my check (1).pdf"), "my_check__1_.pdf");
    }
}
