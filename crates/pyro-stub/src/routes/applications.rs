//! # Applications
//!
//! | Method | Path | Rule |
//! |--------|------|------|
//! | GET    | `/applications` | `view`; applicants see their own, inspectors their county |
//! | POST   | `/applications` | `create`; `save_draft=yes` keeps it a draft |
//! | GET    | `/applications/metrics` | `view`; counts over the visible set |
//! | GET    | `/applications/:id` | `view` |
//! | PUT    | `/applications/:id` | `edit` while editable; stale version → 409 |
//! | DELETE | `/applications/:id` | `delete` or `revoke` while deletable (soft) |
//! | PUT    | `/applications/:id/manage` | `review` / `approve` / `reject` |
//!
//! Status changes go through the record's [`ApplicationLifecycle`], so an
//! illegal transition is a 409 no matter what the caller's role allows.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use pyro_client::{Application, ApplicationMetrics, ApplicationWrite, ManageRequest, Page};
use pyro_core::{Action, ApplicationId, ApplicationType, DocumentType, Role, Service, Timestamp};
use pyro_state::{
    ensure_deletable, ensure_editable, inspection_access, next_status, ApplicationLifecycle,
    ApplicationStatus, ApprovalInput, ManageAction, RejectionInput, Transition,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::{extract_json, AppError};
use crate::routes::{default_offset, extract_query, paginate};
use crate::store::{AppState, StoredApplication};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications).post(create_application))
        .route("/applications/metrics", get(application_metrics))
        .route(
            "/applications/:id",
            get(get_application)
                .put(update_application)
                .delete(delete_application),
        )
        .route("/applications/:id/manage", put(manage_application))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_offset")]
    offset: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    status: Option<ApplicationStatus>,
    #[serde(rename = "type", default)]
    application_type: Option<ApplicationType>,
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Default, Deserialize)]
pub struct WriteFlags {
    #[serde(default)]
    save_draft: Option<String>,
}

impl WriteFlags {
    fn is_draft(&self) -> bool {
        self.save_draft.as_deref() == Some("yes")
    }
}

fn same_county(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

/// Whether `caller` can see `app` at all. Invisible records answer 404.
fn is_visible(caller: &Caller, app: &StoredApplication) -> bool {
    if app.deleted {
        return false;
    }
    match caller.role() {
        Role::Admin => true,
        Role::User => app.record.applicant_user_id == *caller.id(),
        Role::Inspector => {
            app.record.status != ApplicationStatus::Draft
                && same_county(caller.county(), app.record.county.as_deref())
        }
    }
}

/// Every record `caller` may see, refreshed for expiry, in creation order.
fn visible_applications(state: &AppState, caller: &Caller) -> Vec<Application> {
    let today = Utc::now().date_naive();
    let mut visible: Vec<(u64, Application)> = state
        .applications()
        .iter_mut()
        .filter_map(|mut entry| {
            entry.refresh_expiry(today);
            is_visible(caller, &entry).then(|| (entry.seq, entry.record.clone()))
        })
        .collect();
    visible.sort_by_key(|(seq, _)| *seq);
    visible.into_iter().map(|(_, app)| app).collect()
}

/// Run `f` on the record `id` if `caller` may see it.
pub(crate) fn with_application<T>(
    state: &AppState,
    caller: &Caller,
    id: &ApplicationId,
    f: impl FnOnce(&mut StoredApplication) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut entry = state
        .applications()
        .get_mut(id)
        .ok_or_else(|| AppError::not_found(format!("application {id}")))?;
    entry.refresh_expiry(Utc::now().date_naive());
    if !is_visible(caller, &entry) {
        return Err(AppError::not_found(format!("application {id}")));
    }
    f(&mut entry)
}

async fn list_applications(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<Application>>, AppError> {
    let query = extract_query(query)?;
    caller.require(&state, Service::Applications, Action::View)?;
    inspection_access(caller.role(), caller.county())?;

    let items: Vec<Application> = visible_applications(&state, &caller)
        .into_iter()
        .filter(|a| query.status.map_or(true, |s| a.status == s))
        .filter(|a| query.application_type.map_or(true, |t| a.application_type == t))
        .collect();
    Ok(Json(paginate(items, query.offset, query.limit)?))
}

async fn application_metrics(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApplicationMetrics>, AppError> {
    caller.require(&state, Service::Applications, Action::View)?;
    inspection_access(caller.role(), caller.county())?;

    let mut metrics = ApplicationMetrics::default();
    for app in visible_applications(&state, &caller) {
        metrics.total += 1;
        *metrics.by_status.entry(app.status).or_default() += 1;
        *metrics.by_type.entry(app.application_type).or_default() += 1;
    }
    Ok(Json(metrics))
}

async fn get_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ApplicationId>,
) -> Result<Json<Application>, AppError> {
    caller.require(&state, Service::Applications, Action::View)?;
    inspection_access(caller.role(), caller.county())?;
    with_application(&state, &caller, &id, |app| Ok(Json(app.record.clone())))
}

/// Move documents uploaded before the application existed onto it.
fn adopt_user_documents(state: &AppState, caller: &Caller, app: &mut Application) {
    for document_type in DocumentType::ALL {
        if let Some((_, file)) = state
            .user_documents()
            .remove(&(caller.id().clone(), *document_type))
        {
            app.documents_uploaded.insert(*document_type, file);
        }
    }
}

async fn create_application(
    State(state): State<AppState>,
    caller: Caller,
    flags: Result<Query<WriteFlags>, QueryRejection>,
    body: Result<Json<ApplicationWrite>, JsonRejection>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let flags = extract_query(flags)?;
    let body = extract_json(body)?;
    caller.require(&state, Service::Applications, Action::Create)?;

    let application_type = body
        .application_type()
        .ok_or_else(|| AppError::Validation("ApplicationDetails or DraftForm is required".into()))?;
    let id = ApplicationId::new(format!("app-{}", Uuid::new_v4().simple()))?;
    let now = Timestamp::now();
    let mut record = Application {
        application_id: id.clone(),
        application_type,
        applicant_user_id: caller.id().clone(),
        status: ApplicationStatus::Draft,
        application_details: None,
        draft_form: None,
        documents_uploaded: Default::default(),
        submission_time: None,
        last_modified_time: now,
        inspection_time: None,
        start_date: None,
        expiration_date: None,
        user_signature: body.user_signature.clone(),
        inspector_signature: None,
        remarks: None,
        county: None,
    };
    let mut stored = StoredApplication {
        seq: state.next_seq(),
        record: record.clone(),
        lifecycle: ApplicationLifecycle::new_draft(),
        deleted: false,
    };

    if flags.is_draft() {
        let form = body
            .draft_form
            .ok_or_else(|| AppError::Validation("DraftForm is required when saving a draft".into()))?;
        record.draft_form = Some(form);
        stored.record = record;
        stored.apply(Transition::SaveDraft, caller.id(), None)?;
    } else {
        let details = body.application_details.ok_or_else(|| {
            AppError::Validation("ApplicationDetails is required to submit".into())
        })?;
        record.county = details.county().map(str::to_string);
        record.application_details = Some(details);
        record.submission_time = Some(now);
        stored.record = record;
        stored.apply(Transition::Submit, caller.id(), None)?;
    }
    adopt_user_documents(&state, &caller, &mut stored.record);

    let created = stored.record.clone();
    state.applications().insert(id.clone(), stored);
    tracing::info!(
        application_id = %id,
        status = %created.status,
        applicant = %caller.id(),
        "application created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ApplicationId>,
    flags: Result<Query<WriteFlags>, QueryRejection>,
    body: Result<Json<ApplicationWrite>, JsonRejection>,
) -> Result<Json<Application>, AppError> {
    let flags = extract_query(flags)?;
    let body = extract_json(body)?;
    caller.require(&state, Service::Applications, Action::Edit)?;
    inspection_access(caller.role(), caller.county())?;

    with_application(&state, &caller, &id, |app| {
        if let Some(expected) = body.expected_last_modified {
            if expected != app.record.last_modified_time {
                return Err(AppError::Conflict(format!(
                    "application {id} was modified at {}; reload before saving",
                    app.record.last_modified_time
                )));
            }
        }
        ensure_editable(app.record.status)?;
        if let Some(t) = body.application_type() {
            if t != app.record.application_type {
                return Err(AppError::Validation(format!(
                    "application {id} is a {}, not a {t}",
                    app.record.application_type
                )));
            }
        }

        // Every check runs before the record is touched; a refused write
        // leaves it exactly as it was.
        if flags.is_draft() {
            next_status(app.record.status, Transition::SaveDraft)?;
            let form = body.draft_form.clone().ok_or_else(|| {
                AppError::Validation("DraftForm is required when saving a draft".into())
            })?;
            app.apply(Transition::SaveDraft, caller.id(), None)?;
            app.record.draft_form = Some(form);
        } else {
            let details = body.application_details.clone().ok_or_else(|| {
                AppError::Validation("ApplicationDetails is required to submit".into())
            })?;
            if app.record.status == ApplicationStatus::Submitted {
                app.touch();
            } else {
                app.apply(Transition::Submit, caller.id(), None)?;
                app.record.submission_time = Some(Timestamp::now());
            }
            app.record.county = details.county().map(str::to_string);
            app.record.application_details = Some(details);
            app.record.draft_form = None;
        }
        if let Some(signature) = &body.user_signature {
            app.record.user_signature = Some(signature.clone());
        }
        tracing::info!(application_id = %id, status = %app.record.status, "application updated");
        Ok(Json(app.record.clone()))
    })
}

async fn delete_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ApplicationId>,
) -> Result<StatusCode, AppError> {
    let allowed = state.permissions().allowed(Service::Applications, caller.role());
    if !(allowed.contains(Action::Delete) || allowed.contains(Action::Revoke)) {
        return Err(AppError::Forbidden(format!(
            "role '{}' may not delete applications",
            caller.role()
        )));
    }
    with_application(&state, &caller, &id, |app| {
        ensure_deletable(app.record.status)?;
        app.deleted = true;
        app.touch();
        tracing::info!(application_id = %id, by = %caller.id(), "application withdrawn");
        Ok(StatusCode::NO_CONTENT)
    })
}

async fn manage_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<ApplicationId>,
    body: Result<Json<ManageRequest>, JsonRejection>,
) -> Result<Json<Application>, AppError> {
    let body = extract_json(body)?;
    caller.require(&state, Service::Applications, body.action.required_action())?;
    inspection_access(caller.role(), caller.county())?;

    with_application(&state, &caller, &id, |app| {
        next_status(app.record.status, body.action.transition())?;
        match body.action {
            ManageAction::InReview => {
                app.apply(Transition::MarkInReview, caller.id(), None)?;
                app.record.inspection_time = Some(Timestamp::now());
            }
            ManageAction::Approve => {
                let approval = ApprovalInput {
                    inspector_signature: body.inspector_signature.clone().unwrap_or_default(),
                    start_date: body.start_date,
                    expiration_date: body.expiration_date,
                    payment_check_uploaded: app.record.has_document(DocumentType::PaymentCheck),
                }
                .validate()?;
                app.apply(Transition::Approve, caller.id(), None)?;
                app.record.inspector_signature = Some(approval.inspector_signature);
                app.record.start_date = Some(approval.start_date);
                app.record.expiration_date = Some(approval.expiration_date);
            }
            ManageAction::Reject => {
                let rejection =
                    RejectionInput::new(body.remarks.clone().unwrap_or_default()).validate()?;
                app.apply(Transition::Reject, caller.id(), Some(rejection.remarks.clone()))?;
                app.record.remarks = Some(rejection.remarks);
            }
        }
        tracing::info!(
            application_id = %id,
            action = %body.action,
            status = %app.record.status,
            inspector = %caller.id(),
            "application managed"
        );
        Ok(Json(app.record.clone()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StubConfig;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use http_body_util::BodyExt;
    use pyro_client::Account;
    use pyro_core::UserId;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let state = AppState::new(StubConfig::new("http://stub.test"));
        state.put_account(Account::new_applicant(UserId::new("u1").unwrap(), "u1@example.com"));
        state.put_account(Account::new_applicant(UserId::new("u2").unwrap(), "u2@example.com"));
        let mut inspector =
            Account::new_applicant(UserId::new("insp").unwrap(), "insp@example.gov");
        inspector.current_role = Role::Inspector;
        inspector.county = Some("Kent".into());
        state.put_account(inspector);
        state
    }

    fn test_app(state: &AppState) -> Router {
        router().with_state(state.clone())
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json");
        match body {
            Some(v) => builder.body(Body::from(v.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn permit_details(county: &str) -> Value {
        let address = json!({"Street": "1 Main St", "City": "Dover", "State": "DE", "ZipCode": "19901", "County": county});
        let person = json!({
            "FirstName": "Dana", "LastName": "Rivera", "PhoneNumber": "3025550142",
            "Address": address, "Age": 40
        });
        json!({
            "ApplicationType": "permit",
            "Applicant": person,
            "EventType": "public_display",
            "Event": {"EventDate": "2026-07-04", "Location": address},
            "IsControllerSameAsPermittee": true,
            "ControllerDetails": person,
            "DisplayOperatorLicenseNumber": "DOL-1"
        })
    }

    async fn submit(app: &Router, token: &str, county: &str) -> Value {
        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/applications",
                token,
                Some(json!({"ApplicationDetails": permit_details(county)})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    #[tokio::test]
    async fn submit_then_get() {
        let state = test_state();
        let app = test_app(&state);
        let created = submit(&app, "u1", "Kent").await;
        assert_eq!(created["Status"], "submitted");
        assert_eq!(created["County"], "Kent");
        let id = created["ApplicationId"].as_str().unwrap();

        let resp = app
            .clone()
            .oneshot(request("GET", &format!("/applications/{id}"), "u1", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["ApplicationId"], id);
    }

    #[tokio::test]
    async fn other_applicants_cannot_see_it() {
        let state = test_state();
        let app = test_app(&state);
        let created = submit(&app, "u1", "Kent").await;
        let id = created["ApplicationId"].as_str().unwrap();

        let resp = app
            .clone()
            .oneshot(request("GET", &format!("/applications/{id}"), "u2", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .clone()
            .oneshot(request("GET", "/applications", "u2", None))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["total_count"], 0);
    }

    #[tokio::test]
    async fn inspectors_are_scoped_by_county() {
        let state = test_state();
        let app = test_app(&state);
        submit(&app, "u1", "Kent").await;
        submit(&app, "u1", "Sussex").await;

        let resp = app
            .clone()
            .oneshot(request("GET", "/applications", "insp", None))
            .await
            .unwrap();
        let page = body_json(resp).await;
        assert_eq!(page["total_count"], 1);
        assert_eq!(page["items"][0]["County"], "Kent");
    }

    #[tokio::test]
    async fn inspector_without_county_is_refused() {
        let state = test_state();
        let mut inspector =
            Account::new_applicant(UserId::new("nocounty").unwrap(), "n@example.gov");
        inspector.current_role = Role::Inspector;
        state.put_account(inspector);
        let resp = test_app(&state)
            .oneshot(request("GET", "/applications", "nocounty", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn draft_then_submit_via_update() {
        let state = test_state();
        let app = test_app(&state);
        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/applications?save_draft=yes",
                "u1",
                Some(json!({"DraftForm": {"ApplicationType": "permit"}})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let draft = body_json(resp).await;
        assert_eq!(draft["Status"], "draft");
        let id = draft["ApplicationId"].as_str().unwrap();

        let resp = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/applications/{id}"),
                "u1",
                Some(json!({"ApplicationDetails": permit_details("Kent")})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let submitted = body_json(resp).await;
        assert_eq!(submitted["Status"], "submitted");
        assert!(submitted.get("DraftForm").is_none());
        assert!(!submitted["SubmissionTime"].is_null());
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let state = test_state();
        let app = test_app(&state);
        let created = submit(&app, "u1", "Kent").await;
        let id = created["ApplicationId"].as_str().unwrap();
        let read_at = created["LastModifiedTime"].clone();

        let write = json!({"ApplicationDetails": permit_details("Kent"), "ExpectedLastModified": read_at});
        let first = app
            .clone()
            .oneshot(request("PUT", &format!("/applications/{id}"), "u1", Some(write.clone())))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .clone()
            .oneshot(request("PUT", &format!("/applications/{id}"), "u1", Some(write)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn refused_update_leaves_the_record_unchanged() {
        let state = test_state();
        let app = test_app(&state);
        let created = submit(&app, "u1", "Kent").await;
        let id = created["ApplicationId"].as_str().unwrap();

        // A submitted record can no longer be saved as a draft.
        let write = json!({
            "UserSignature": "data:image/png;base64,bmV3",
            "DraftForm": {"ApplicationType": "permit"}
        });
        let resp = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/applications/{id}?save_draft=yes"),
                "u1",
                Some(write),
            ))
            .await
            .unwrap();
        assert!(resp.status().is_client_error(), "{}", resp.status());

        // Nor submitted without details.
        let write = json!({"UserSignature": "data:image/png;base64,bmV3"});
        let resp = app
            .clone()
            .oneshot(request("PUT", &format!("/applications/{id}"), "u1", Some(write)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = app
            .clone()
            .oneshot(request("GET", &format!("/applications/{id}"), "u1", None))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, created);
    }

    #[tokio::test]
    async fn manage_enforces_transitions_and_payloads() {
        let state = test_state();
        let app = test_app(&state);
        let created = submit(&app, "u1", "Kent").await;
        let id = created["ApplicationId"].as_str().unwrap();
        let manage = format!("/applications/{id}/manage");

        // Approving straight from submitted skips review.
        let resp = app
            .clone()
            .oneshot(request("PUT", &manage, "insp", Some(json!({"Action": "approve"}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // Applicants hold no review permission.
        let resp = app
            .clone()
            .oneshot(request("PUT", &manage, "u1", Some(json!({"Action": "in-review"}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app
            .clone()
            .oneshot(request("PUT", &manage, "insp", Some(json!({"Action": "in-review"}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["Status"], "in-review");

        let resp = app
            .clone()
            .oneshot(request(
                "PUT",
                &manage,
                "insp",
                Some(json!({
                    "Action": "approve",
                    "InspectorSignature": "data:image/png;base64,AA",
                    "StartDate": "2026-07-01",
                    "ExpirationDate": "2027-06-30"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("payment check must be uploaded"));

        let resp = app
            .clone()
            .oneshot(request("PUT", &manage, "insp", Some(json!({"Action": "reject", "Remarks": "  "}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = app
            .clone()
            .oneshot(request(
                "PUT",
                &manage,
                "insp",
                Some(json!({"Action": "reject", "Remarks": "Site plan missing"})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let rejected = body_json(resp).await;
        assert_eq!(rejected["Status"], "rejected");
        assert_eq!(rejected["Remarks"], "Site plan missing");
    }

    #[tokio::test]
    async fn delete_is_soft_and_status_gated() {
        let state = test_state();
        let app = test_app(&state);
        let created = submit(&app, "u1", "Kent").await;
        let id = created["ApplicationId"].as_str().unwrap();

        let resp = app
            .clone()
            .oneshot(request("PUT", &format!("/applications/{id}/manage"), "insp", Some(json!({"Action": "in-review"}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(request("DELETE", &format!("/applications/{id}"), "u1", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let other = submit(&app, "u1", "Kent").await;
        let other_id = other["ApplicationId"].as_str().unwrap();
        let resp = app
            .clone()
            .oneshot(request("DELETE", &format!("/applications/{other_id}"), "u1", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let stored = state
            .applications()
            .get(&ApplicationId::new(other_id).unwrap())
            .map(|a| a.deleted);
        assert_eq!(stored, Some(true));

        let resp = app
            .clone()
            .oneshot(request("GET", &format!("/applications/{other_id}"), "u1", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_is_stable_and_filtered() {
        let state = test_state();
        let app = test_app(&state);
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(submit(&app, "u1", "Kent").await["ApplicationId"].clone());
        }

        let page = |uri: &'static str| {
            let app = app.clone();
            async move { body_json(app.oneshot(request("GET", uri, "u1", None)).await.unwrap()).await }
        };
        let first = page("/applications?offset=1&limit=2").await;
        let again = page("/applications?offset=1&limit=2").await;
        assert_eq!(first, again);
        assert_eq!(first["total_count"], 3);
        assert_eq!(first["items"][0]["ApplicationId"], ids[0]);
        assert_eq!(first["items"][1]["ApplicationId"], ids[1]);

        let second = page("/applications?offset=2&limit=2").await;
        assert_eq!(second["items"][0]["ApplicationId"], ids[2]);

        let drafts = page("/applications?status=draft").await;
        assert_eq!(drafts["total_count"], 0);
        let licenses = page("/applications?type=license").await;
        assert_eq!(licenses["total_count"], 0);
    }

    #[tokio::test]
    async fn metrics_count_visible_records() {
        let state = test_state();
        let app = test_app(&state);
        submit(&app, "u1", "Kent").await;
        submit(&app, "u2", "Kent").await;

        let resp = app
            .clone()
            .oneshot(request("GET", "/applications/metrics", "u1", None))
            .await
            .unwrap();
        let metrics = body_json(resp).await;
        assert_eq!(metrics["Total"], 1);
        assert_eq!(metrics["ByStatus"]["submitted"], 1);

        let resp = app
            .clone()
            .oneshot(request("GET", "/applications/metrics", "admin", None))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["Total"], 2);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let state = test_state();
        let resp = test_app(&state)
            .oneshot(Request::builder().uri("/applications").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
