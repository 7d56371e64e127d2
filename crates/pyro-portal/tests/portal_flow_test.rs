//! Workflow, submission, and upload orchestration against a wiremock
//! backend. Each test asserts both what was sent and what was refused
//! before reaching the network.

use std::sync::Arc;

use parking_lot::Mutex;
use pyro_client::{Account, Application, ClientConfig, CollectingNotifier, PortalClient, StaticToken};
use pyro_core::{DocumentType, EventType, Role, UserId};
use pyro_portal::{
    reduce, save_draft, submit_application, ApproveDialog, DenyDialog, PortalEvent, PortalState,
    SubmissionContext, SubmissionError, UploadPipeline, UploadState, ViewerKind, Workflow,
    WorkflowError,
};
use pyro_schema::{Address, ApplicationForm, PermitForm, PersonDetails};
use pyro_state::{ApplicationStatus, PermissionTable};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> (PortalClient, Arc<CollectingNotifier>) {
    let config = ClientConfig::new(&server.uri(), "t").unwrap();
    let notifier = Arc::new(CollectingNotifier::new());
    let client =
        PortalClient::with_parts(config, Arc::new(StaticToken::new("t")), notifier.clone()).unwrap();
    (client, notifier)
}

fn record(status: &str) -> serde_json::Value {
    serde_json::json!({
        "ApplicationId": "a1",
        "ApplicationType": "permit",
        "ApplicantUserId": "u1",
        "Status": status,
        "LastModifiedTime": "2026-06-01T10:00:00Z"
    })
}

fn application(status: &str) -> Application {
    serde_json::from_value(record(status)).unwrap()
}

fn inspector(county: Option<&str>) -> Account {
    let mut account = Account::new_applicant(UserId::new("i1").unwrap(), "i1@example.gov");
    account.current_role = Role::Inspector;
    account.county = county.map(String::from);
    account.user_signature = Some("data:image/png;base64,iVBORw0".into());
    account
}

fn person() -> PersonDetails {
    PersonDetails {
        first_name: "Dana".into(),
        last_name: "Rivera".into(),
        phone_number: "(302) 555-0142".into(),
        address: Address {
            street: "12 Powder Mill Rd".into(),
            city: "Dover".into(),
            state: "DE".into(),
            zip_code: "19901".into(),
            county: Some("Kent".into()),
        },
        age: "42".into(),
    }
}

fn permit_form() -> PermitForm {
    let mut form = PermitForm {
        applicant: person(),
        event_type: Some(EventType::PublicDisplay),
        is_controller_same_as_permittee: true,
        display_operator_license_number: "DOL-1142".into(),
        ..PermitForm::default()
    };
    form.event.event_date = chrono::NaiveDate::from_ymd_opt(2026, 7, 4);
    form.event.location = person().address;
    form.event.description = "Independence Day display".into();
    form
}

// ── Workflow ─────────────────────────────────────────────────────────

#[tokio::test]
async fn mark_in_review_sends_one_mutation() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/applications/a1/manage"))
        .and(body_partial_json(serde_json::json!({"Action": "in-review"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(record("in-review")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let workflow = Workflow::new(client, Arc::new(PermissionTable::default()), &inspector(Some("Kent")));
    let before = application("submitted");
    let after = workflow.mark_in_review(&before).await.unwrap();
    assert_eq!(after.status, ApplicationStatus::InReview);
    assert_eq!(before.status, ApplicationStatus::Submitted);
    assert!(!workflow.is_loading());
}

#[tokio::test]
async fn illegal_transition_is_refused_locally() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record("approved")))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let workflow = Workflow::new(client, Arc::new(PermissionTable::default()), &inspector(Some("Kent")));
    let mut deny = DenyDialog::new();
    deny.set_reason("Incomplete site plan");

    let err = workflow.reject(&application("submitted"), &deny).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Status(_)));
}

#[tokio::test]
async fn inspector_without_county_is_refused() {
    let server = MockServer::start().await;
    let (client, _) = client(&server);
    let workflow = Workflow::new(client, Arc::new(PermissionTable::default()), &inspector(None));
    let err = workflow.mark_in_review(&application("submitted")).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Gate(_)));
}

#[tokio::test]
async fn applicant_cannot_approve() {
    let server = MockServer::start().await;
    let (client, _) = client(&server);
    let applicant = Account::new_applicant(UserId::new("u1").unwrap(), "u1@example.gov");
    let workflow = Workflow::new(client, Arc::new(PermissionTable::default()), &applicant);
    let app = application("in-review");
    let dialog = ApproveDialog::for_application(&app, Some(&applicant));
    let err = workflow.approve(&app, &dialog).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NotPermitted { .. }));
}

#[tokio::test]
async fn deny_with_blank_reason_never_calls_backend() {
    let server = MockServer::start().await;
    let (client, _) = client(&server);
    let workflow = Workflow::new(client, Arc::new(PermissionTable::default()), &inspector(Some("Kent")));
    let mut deny = DenyDialog::new();
    deny.set_reason("  ");
    let err = workflow.reject(&application("in-review"), &deny).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Manage(_)));
}

#[tokio::test]
async fn failed_mutation_releases_guard() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/applications/a1/manage"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let (client, notifier) = client(&server);
    let workflow = Workflow::new(client, Arc::new(PermissionTable::default()), &inspector(Some("Kent")));
    let app = application("submitted");
    assert!(matches!(
        workflow.mark_in_review(&app).await,
        Err(WorkflowError::Client(_))
    ));
    assert!(!workflow.is_loading());
    assert!(workflow.mark_in_review(&app).await.is_err());
    assert_eq!(notifier.toasts().len(), 2);
}

// ── Submission ───────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_form_never_reaches_network() {
    let server = MockServer::start().await;
    let (client, _) = client(&server);
    let table = PermissionTable::default();
    let ctx = SubmissionContext {
        client: &client,
        table: &table,
        role: Role::User,
    };
    let err = submit_application(ctx, ApplicationForm::Permit(PermitForm::default()), None, None)
        .await
        .unwrap_err();
    match err {
        SubmissionError::Invalid(errors) => {
            assert!(errors.message_for("Applicant.FirstName").is_some());
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_mirrors_controller_and_sends_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/applications"))
        .and(body_partial_json(serde_json::json!({
            "ApplicationDetails": {
                "ApplicationType": "permit",
                "ControllerDetails": {"FirstName": "Dana", "PhoneNumber": "3025550142"}
            },
            "UserSignature": "sig"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(record("submitted")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let table = PermissionTable::default();
    let ctx = SubmissionContext {
        client: &client,
        table: &table,
        role: Role::User,
    };
    let saved = submit_application(ctx, ApplicationForm::Permit(permit_form()), None, Some("sig".into()))
        .await
        .unwrap();
    assert_eq!(saved.status, ApplicationStatus::Submitted);
}

#[tokio::test]
async fn resubmitting_sends_version_token_and_reports_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/applications/a1"))
        .and(body_partial_json(serde_json::json!({
            "ExpectedLastModified": "2026-06-01T10:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": {"code": "CONFLICT", "message": "application a1 was modified since it was read"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let table = PermissionTable::default();
    let ctx = SubmissionContext {
        client: &client,
        table: &table,
        role: Role::User,
    };
    let existing = application("draft");
    let err = submit_application(ctx, ApplicationForm::Permit(permit_form()), Some(&existing), None)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn draft_save_skips_validation_but_not_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/applications"))
        .and(query_param("save_draft", "yes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(record("draft")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let table = PermissionTable::default();
    let ctx = SubmissionContext {
        client: &client,
        table: &table,
        role: Role::User,
    };
    let partial = ApplicationForm::Permit(PermitForm::default());
    let saved = save_draft(ctx, partial.clone(), None).await.unwrap();
    assert_eq!(saved.status, ApplicationStatus::Draft);

    let err = save_draft(ctx, partial, Some(&application("submitted")))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Status(_)));
}

#[tokio::test]
async fn inspectors_cannot_create() {
    let server = MockServer::start().await;
    let (client, _) = client(&server);
    let table = PermissionTable::default();
    let ctx = SubmissionContext {
        client: &client,
        table: &table,
        role: Role::Inspector,
    };
    let err = save_draft(ctx, ApplicationForm::Permit(PermitForm::default()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::NotPermitted { .. }));
}

// ── Uploads ──────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_walks_loading_to_uploaded_and_feeds_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "UploadUrl": format!("{}/uploads/a1/site_plan/plan.pdf", server.uri()),
            "Key": "a1/site_plan/plan.pdf",
            "ExpiresAt": "2026-06-01T10:15:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/uploads/a1/site_plan/plan.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let state = Arc::new(Mutex::new(PortalState::default()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_state = state.clone();
    let sink_seen = seen.clone();
    let pipeline = UploadPipeline::new(client).with_sink(Arc::new(move |event: PortalEvent| {
        let mut guard = sink_state.lock();
        *guard = reduce(std::mem::take(&mut *guard), &event);
        sink_seen.lock().push(event);
    }));

    let id = pyro_core::ApplicationId::new("a1").unwrap();
    pipeline
        .upload(DocumentType::SitePlan, Some(&id), "plan.pdf", vec![0u8; 100 * 1024])
        .await
        .unwrap();

    let expected = UploadState::Uploaded {
        display_name: "plan.pdf".into(),
    };
    assert_eq!(pipeline.state(DocumentType::SitePlan), expected);
    assert_eq!(state.lock().upload(DocumentType::SitePlan), &expected);
    let events = seen.lock();
    assert!(matches!(
        events.first(),
        Some(PortalEvent::UploadChanged {
            state: UploadState::Loading { percent: 0 },
            ..
        })
    ));
}

#[tokio::test]
async fn failed_upload_is_scoped_to_its_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "UploadUrl": format!("{}/uploads/k", server.uri()),
            "Key": "k",
            "ExpiresAt": "2026-06-01T10:15:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/uploads/k"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let (client, notifier) = client(&server);
    let pipeline = UploadPipeline::new(client);
    let result = pipeline
        .upload(DocumentType::PaymentCheck, None, "check.png", vec![1, 2, 3])
        .await;
    assert!(result.is_err());
    assert!(matches!(
        pipeline.state(DocumentType::PaymentCheck),
        UploadState::Error { .. }
    ));
    assert_eq!(pipeline.state(DocumentType::SitePlan), UploadState::Idle);
    assert!(notifier.toasts().is_empty());

    // Replacing re-enters the same path.
    assert!(pipeline
        .upload(DocumentType::PaymentCheck, None, "check.png", vec![1, 2, 3])
        .await
        .is_err());
}

#[tokio::test]
async fn view_selects_viewer_by_extension() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(query_param("DocumentType", "site_plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Url": "https://files.example.gov/a1/site_plan/plan.pdf?sig=1",
            "FileName": "plan.pdf",
            "ExpiresAt": "2026-06-01T10:05:00Z"
        })))
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    let view = UploadPipeline::new(client)
        .view(DocumentType::SitePlan, None)
        .await
        .unwrap();
    assert_eq!(view.viewer, ViewerKind::Pdf);
}
