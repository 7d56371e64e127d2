//! # pyro-cli: Permit Portal Command Line
//!
//! Provides the `pyro` command-line interface over the same client, state
//! rules, and workflow the portal uses.
//!
//! ## Subcommands
//!
//! - `pyro applications`: list, show, submit, draft, review, approve, deny, delete.
//! - `pyro documents`: upload and view supporting documents.
//! - `pyro permissions`: print the permission table.
//! - `pyro validate`: check a form file offline.
//! - `pyro render`: printable permit or license markup.
//! - `pyro metrics`: dashboard counts.
//!
//! ```bash
//! export PYRO_API_URL=http://127.0.0.1:8095 PYRO_API_TOKEN=u1 PYRO_USER_ID=u1
//! pyro validate permit.yaml
//! pyro applications submit permit.yaml
//! pyro applications list --status submitted
//! ```

pub mod applications;
pub mod context;
pub mod documents;
pub mod forms;
pub mod permissions;
pub mod report;
