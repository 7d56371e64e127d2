//! # Connection and Identity
//!
//! Every networked subcommand needs a client, the permission table, and the
//! signed-in account. The account is created on first use and cached with
//! the user id under the state directory, so later invocations can omit
//! `--user`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use pyro_client::config::DEVELOPMENT_API_URL;
use pyro_client::{Account, ClientConfig, PortalClient};
use pyro_core::{Role, UserId};
use pyro_portal::{
    load_persisted, reduce, save_persisted, FileStore, PortalEvent, PortalState,
    SubmissionContext, Workflow, PERSIST_NAMESPACE,
};
use pyro_state::PermissionTable;

/// Default state directory, relative to the working directory.
pub const DEFAULT_STATE_DIR: &str = ".pyro";

/// Connection flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// Portal API base URL.
    #[arg(long, env = "PYRO_API_URL", default_value = DEVELOPMENT_API_URL, global = true)]
    pub api_url: String,

    /// Bearer token for the API.
    #[arg(long, env = "PYRO_API_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Account to act as. Defaults to the last signed-in account.
    #[arg(long, env = "PYRO_USER_ID", global = true)]
    pub user: Option<String>,

    /// Email recorded when the account is first created.
    #[arg(long, env = "PYRO_USER_EMAIL", global = true)]
    pub email: Option<String>,

    /// Directory holding the persisted session.
    #[arg(long, env = "PYRO_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Permission table (YAML or JSON). Defaults to the built-in table.
    #[arg(long, env = "PYRO_PERMISSIONS", global = true)]
    pub permissions: Option<PathBuf>,
}

impl ConnectArgs {
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }
}

/// The configured permission table, or the built-in one.
pub fn load_permissions(path: Option<&Path>) -> Result<PermissionTable> {
    match path {
        Some(path) => PermissionTable::load(path)
            .with_context(|| format!("loading permission table {}", path.display())),
        None => Ok(PermissionTable::default()),
    }
}

/// `--user` wins over the persisted identity.
fn resolve_user(args: &ConnectArgs, persisted: &PortalState) -> Result<(UserId, String)> {
    match &args.user {
        Some(raw) => {
            let user_id = UserId::new(raw.as_str())?;
            let email = args
                .email
                .clone()
                .or_else(|| {
                    (persisted.auth.user_id.as_ref() == Some(&user_id))
                        .then(|| persisted.auth.email.clone())
                        .flatten()
                })
                .unwrap_or_default();
            Ok((user_id, email))
        }
        None => match &persisted.auth.user_id {
            Some(user_id) => Ok((
                user_id.clone(),
                args.email
                    .clone()
                    .or_else(|| persisted.auth.email.clone())
                    .unwrap_or_default(),
            )),
            None => bail!("no signed-in account; pass --user or set PYRO_USER_ID"),
        },
    }
}

/// A signed-in session against the portal API.
pub struct PortalContext {
    pub client: PortalClient,
    pub table: Arc<PermissionTable>,
    pub account: Account,
}

impl PortalContext {
    /// Sign in: build the client, create or load the account, and persist
    /// the identity for the next invocation.
    pub async fn connect(args: &ConnectArgs) -> Result<Self> {
        let table = Arc::new(load_permissions(args.permissions.as_deref())?);
        let store = FileStore::new(args.state_dir(), PERSIST_NAMESPACE)?;
        let state = load_persisted(&store).context("reading persisted session")?;
        let (user_id, email) = resolve_user(args, &state)?;

        let Some(token) = args.token.as_deref() else {
            bail!("no API token; pass --token or set PYRO_API_TOKEN");
        };
        let client = PortalClient::new(ClientConfig::new(&args.api_url, token)?)?;

        let state = reduce(
            state,
            &PortalEvent::SignedIn {
                user_id: user_id.clone(),
                email: email.clone(),
            },
        );
        let state = reduce(state, &PortalEvent::AccountLoading);
        let account = match client
            .users()
            .ensure_account(&Account::new_applicant(user_id.clone(), email))
            .await
        {
            Ok(account) => account,
            Err(e) => {
                let message = e.user_message();
                let state = reduce(state, &PortalEvent::AccountFailed { message });
                save_persisted(&store, &state)?;
                return Err(e).with_context(|| format!("loading account {user_id}"));
            }
        };
        let state = reduce(
            state,
            &PortalEvent::AccountLoaded {
                account: account.clone(),
            },
        );
        save_persisted(&store, &state)?;
        tracing::debug!(user_id = %account.user_id, role = %account.current_role, "signed in");

        Ok(Self {
            client,
            table,
            account,
        })
    }

    pub fn role(&self) -> Role {
        self.account.current_role
    }

    pub fn submission(&self) -> SubmissionContext<'_> {
        SubmissionContext {
            client: &self.client,
            table: &self.table,
            role: self.role(),
        }
    }

    pub fn workflow(&self) -> Workflow {
        Workflow::new(self.client.clone(), self.table.clone(), &self.account)
    }
}
