//! Shared harness: a stub on an ephemeral port and clients signed in as
//! named accounts. The stub trusts the bearer token as the user id.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use pyro_client::session::RefreshFuture;
use pyro_client::RefreshError;
use pyro_client::{
    Account, Application, ClientConfig, CollectingNotifier, PortalClient, RoleChange, TokenSource,
};
use pyro_core::{Role, UserId};
use pyro_portal::{submit_application, SubmissionContext};
use pyro_schema::ApplicationForm;
use pyro_state::PermissionTable;
use pyro_stub::RunningStub;
use serde_json::json;
use zeroize::Zeroizing;

/// A token whose refresh always succeeds, so an authorization refusal
/// surfaces as the server's status instead of an expired session.
pub struct UserToken(String);

impl TokenSource for UserToken {
    fn access_token(&self) -> Option<Zeroizing<String>> {
        Some(Zeroizing::new(self.0.clone()))
    }

    fn refresh(&self) -> RefreshFuture<'_> {
        Box::pin(async { Ok::<(), RefreshError>(()) })
    }
}

pub struct Harness {
    pub stub: RunningStub,
    pub table: Arc<PermissionTable>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.stub.handle.abort();
    }
}

pub struct Session {
    pub client: PortalClient,
    pub account: Account,
    pub notifier: Arc<CollectingNotifier>,
}

impl Session {
    pub fn submission<'a>(&'a self, table: &'a Arc<PermissionTable>) -> SubmissionContext<'a> {
        SubmissionContext {
            client: &self.client,
            table: table.as_ref(),
            role: self.account.current_role,
        }
    }
}

impl Harness {
    pub async fn start() -> Self {
        let stub = pyro_stub::spawn(SocketAddr::from(([127, 0, 0, 1], 0)), None, |c| c)
            .await
            .expect("bind stub");
        Self {
            stub,
            table: Arc::new(PermissionTable::default()),
        }
    }

    /// A fresh client (empty cache) authenticated as `user`.
    pub fn client(&self, user: &str) -> (PortalClient, Arc<CollectingNotifier>) {
        let config = ClientConfig::new(&self.stub.base_url(), user).unwrap();
        let notifier = Arc::new(CollectingNotifier::new());
        let client = PortalClient::with_parts(
            config,
            Arc::new(UserToken(user.to_string())),
            notifier.clone(),
        )
        .unwrap();
        (client, notifier)
    }

    /// Sign in as `user`, creating the account on first use.
    pub async fn sign_in(&self, user: &str) -> Session {
        let (client, notifier) = self.client(user);
        let template = Account::new_applicant(UserId::new(user).unwrap(), format!("{user}@example.com"));
        let account = client.users().ensure_account(&template).await.unwrap();
        Session {
            client,
            account,
            notifier,
        }
    }

    /// Sign up `user`, have the seeded admin make them an inspector for
    /// `county`, and return their new session.
    pub async fn inspector(&self, user: &str, county: Option<&str>) -> Session {
        self.sign_in(user).await;
        let admin = self.sign_in("admin").await;
        admin
            .client
            .users()
            .change_role(&RoleChange {
                user_id: UserId::new(user).unwrap(),
                role: Role::Inspector,
            })
            .await
            .unwrap();

        let mut session = self.sign_in(user).await;
        assert_eq!(session.account.current_role, Role::Inspector);
        if let Some(county) = county {
            let mut account = session.account.clone();
            account.county = Some(county.to_string());
            session.account = session.client.users().update(&account).await.unwrap();
        }
        session
    }

    /// Submit a complete permit for an event in `county`.
    pub async fn submit_permit(&self, session: &Session, county: &str) -> Application {
        submit_application(
            session.submission(&self.table),
            permit_form(county),
            None,
            Some(format!("signed:{}", session.account.user_id)),
        )
        .await
        .unwrap()
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub fn address(county: &str) -> serde_json::Value {
    json!({
        "Street": "12 Powder Mill Rd",
        "City": "Dover",
        "State": "DE",
        "ZipCode": "19901",
        "County": county,
    })
}

pub fn person(first: &str, county: &str) -> serde_json::Value {
    json!({
        "FirstName": first,
        "LastName": "Rivera",
        "PhoneNumber": "(302) 555-0142",
        "Age": "42",
        "Address": address(county),
    })
}

/// A permit form that passes validation.
pub fn permit_form(county: &str) -> ApplicationForm {
    serde_json::from_value(json!({
        "ApplicationType": "permit",
        "Applicant": person("Ana", county),
        "EventType": "public_display",
        "Event": {
            "EventDate": days_from_today(30).to_string(),
            "RainDate": days_from_today(31).to_string(),
            "Location": address(county),
            "Description": "Harbor fireworks",
        },
        "IsControllerSameAsPermittee": true,
        "DisplayOperatorLicenseNumber": "DO-4471",
    }))
    .unwrap()
}

/// A permit form missing most of what a submission needs.
pub fn partial_permit_form() -> ApplicationForm {
    serde_json::from_value(json!({
        "ApplicationType": "permit",
        "Applicant": { "FirstName": "Ana" },
    }))
    .unwrap()
}
