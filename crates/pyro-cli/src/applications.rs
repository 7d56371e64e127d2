//! # Applications Subcommand
//!
//! Browse, submit, and review applications as the signed-in account.
//!
//! ## Subcommands
//!
//! - `list`: one page of visible applications.
//! - `show`: one application and the actions offered on it.
//! - `submit`: validate a form file and submit it (new or existing record).
//! - `draft`: save a form file as a draft without validating it.
//! - `review`: submitted → in-review.
//! - `approve`: in-review → approved.
//! - `deny`: in-review → rejected.
//! - `delete`: soft delete a draft, pending, or submitted application.
//!
//! Every rule the server enforces is checked locally first, so a refused
//! action fails before any request is sent.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use pyro_client::{Application, ApplicationQuery, RequestOptions};
use pyro_core::{ApplicationId, ApplicationType, DocumentType};
use pyro_portal::{
    save_draft, submit_application, ApproveDialog, DenyDialog, SubmissionError, UploadPipeline,
};
use pyro_state::ApplicationStatus;

use crate::context::{ConnectArgs, PortalContext};
use crate::forms::load_form;

#[derive(Args, Debug)]
pub struct ApplicationsArgs {
    #[command(subcommand)]
    pub command: ApplicationsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ApplicationsCommand {
    /// List one page of applications.
    List {
        #[arg(long)]
        status: Option<ApplicationStatus>,
        #[arg(long = "type")]
        application_type: Option<ApplicationType>,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        offset: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Print the raw page as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one application.
    Show {
        id: ApplicationId,
        #[arg(long)]
        json: bool,
    },

    /// Validate and submit a form file.
    Submit {
        form: PathBuf,
        /// Submit into this existing draft, pending, or submitted record.
        #[arg(long)]
        id: Option<ApplicationId>,
        /// Applicant signature. Defaults to the one stored on the account.
        #[arg(long)]
        signature: Option<String>,
    },

    /// Save a form file as a draft.
    Draft {
        form: PathBuf,
        /// Overwrite this existing draft.
        #[arg(long)]
        id: Option<ApplicationId>,
    },

    /// Start the inspection of a submitted application.
    Review { id: ApplicationId },

    /// Approve an application under review.
    Approve {
        id: ApplicationId,
        /// Inspector signature. Defaults to the one stored on the account.
        #[arg(long)]
        signature: Option<String>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        expiration_date: Option<NaiveDate>,
        /// Upload the payment check before approving.
        #[arg(long)]
        payment_check: Option<PathBuf>,
    },

    /// Reject an application under review.
    Deny {
        id: ApplicationId,
        #[arg(long)]
        reason: String,
    },

    /// Withdraw a draft, pending, or submitted application.
    Delete { id: ApplicationId },
}

pub async fn run_applications(args: &ApplicationsArgs, connect: &ConnectArgs) -> Result<u8> {
    let ctx = PortalContext::connect(connect).await?;

    match &args.command {
        ApplicationsCommand::List {
            status,
            application_type,
            offset,
            limit,
            json,
        } => {
            let mut query = ApplicationQuery::default().page(*offset, *limit);
            query.status = *status;
            query.application_type = *application_type;
            cmd_list(&ctx, &query, *json).await
        }
        ApplicationsCommand::Show { id, json } => cmd_show(&ctx, id, *json).await,
        ApplicationsCommand::Submit {
            form,
            id,
            signature,
        } => cmd_submit(&ctx, form, id.as_ref(), signature.clone()).await,
        ApplicationsCommand::Draft { form, id } => cmd_draft(&ctx, form, id.as_ref()).await,
        ApplicationsCommand::Review { id } => {
            let app = fetch(&ctx, id).await?;
            let updated = ctx.workflow().mark_in_review(&app).await?;
            report_transition(&app, &updated);
            Ok(0)
        }
        ApplicationsCommand::Approve {
            id,
            signature,
            start_date,
            expiration_date,
            payment_check,
        } => {
            cmd_approve(
                &ctx,
                id,
                signature.as_deref(),
                *start_date,
                *expiration_date,
                payment_check.as_deref(),
            )
            .await
        }
        ApplicationsCommand::Deny { id, reason } => {
            let app = fetch(&ctx, id).await?;
            let mut dialog = DenyDialog::new();
            dialog.set_reason(reason.as_str());
            let updated = ctx.workflow().reject(&app, &dialog).await?;
            report_transition(&app, &updated);
            Ok(0)
        }
        ApplicationsCommand::Delete { id } => {
            let app = fetch(&ctx, id).await?;
            ctx.workflow().delete(&app).await?;
            println!("OK: application {id} deleted");
            Ok(0)
        }
    }
}

async fn fetch(ctx: &PortalContext, id: &ApplicationId) -> Result<Application> {
    ctx.client
        .applications()
        .get(id, RequestOptions::silent())
        .await
        .with_context(|| format!("loading application {id}"))
}

/// One-line summary used by `list`.
pub fn summary_line(app: &Application, today: NaiveDate) -> String {
    format!(
        "{:<40}{:<9}{:<11}{}",
        app.application_id.as_str(),
        app.application_type.as_str(),
        app.effective_status(today).as_str(),
        app.last_modified_time
    )
}

async fn cmd_list(ctx: &PortalContext, query: &ApplicationQuery, json: bool) -> Result<u8> {
    let page = ctx
        .client
        .applications()
        .list(query, RequestOptions::default())
        .await
        .context("listing applications")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(0);
    }

    let today = chrono::Utc::now().date_naive();
    for app in &page.items {
        println!("{}", summary_line(app, today));
    }
    let shown = page.items.len() as u64;
    println!(
        "page {} ({} of {} applications)",
        query.offset, shown, page.total_count
    );
    Ok(0)
}

async fn cmd_show(ctx: &PortalContext, id: &ApplicationId, json: bool) -> Result<u8> {
    let app = fetch(ctx, id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&app)?);
        return Ok(0);
    }

    let today = chrono::Utc::now().date_naive();
    println!("Application: {}", app.application_id);
    println!("  Type: {}", app.application_type);
    println!("  Status: {}", app.effective_status(today));
    println!("  Applicant: {}", app.applicant_user_id);
    if let Some(county) = &app.county {
        println!("  County: {county}");
    }
    if let Some(submitted) = &app.submission_time {
        println!("  Submitted: {submitted}");
    }
    println!("  Last modified: {}", app.last_modified_time);
    if let (Some(start), Some(expires)) = (app.start_date, app.expiration_date) {
        println!("  Valid: {start} to {expires}");
    }
    if let Some(remarks) = &app.remarks {
        println!("  Remarks: {remarks}");
    }
    for (document_type, file) in &app.documents_uploaded {
        println!("  Document {}: {} ({} bytes)", document_type, file.file_name, file.size);
    }

    let panel = ctx.workflow().panel(&app);
    let offered: Vec<String> = panel
        .offered()
        .iter()
        .map(|a| format!("{a:?}"))
        .collect();
    if offered.is_empty() {
        println!("  Actions: none");
    } else {
        println!("  Actions: {}", offered.join(", "));
    }
    Ok(0)
}

/// Print field errors and return exit code 1 for an invalid form; other
/// submission failures propagate.
fn submission_outcome(result: Result<Application, SubmissionError>, verb: &str) -> Result<u8> {
    match result {
        Ok(app) => {
            println!("OK: application {} {verb} ({})", app.application_id, app.status);
            Ok(0)
        }
        Err(SubmissionError::Invalid(errors)) => {
            println!("FAIL: form not {verb}");
            println!("{errors}");
            Ok(1)
        }
        Err(e) if e.is_conflict() => Err(anyhow::Error::new(e)
            .context("the application changed since it was loaded; show it again and retry")),
        Err(e) => Err(e.into()),
    }
}

async fn cmd_submit(
    ctx: &PortalContext,
    form: &Path,
    id: Option<&ApplicationId>,
    signature: Option<String>,
) -> Result<u8> {
    let form = load_form(form)?;
    let existing = match id {
        Some(id) => Some(fetch(ctx, id).await?),
        None => None,
    };
    let signature = signature.or_else(|| ctx.account.user_signature.clone());
    let result = submit_application(ctx.submission(), form, existing.as_ref(), signature).await;
    submission_outcome(result, "submitted")
}

async fn cmd_draft(ctx: &PortalContext, form: &Path, id: Option<&ApplicationId>) -> Result<u8> {
    let form = load_form(form)?;
    let existing = match id {
        Some(id) => Some(fetch(ctx, id).await?),
        None => None,
    };
    let result = save_draft(ctx.submission(), form, existing.as_ref()).await;
    submission_outcome(result, "saved")
}

async fn cmd_approve(
    ctx: &PortalContext,
    id: &ApplicationId,
    signature: Option<&str>,
    start_date: Option<NaiveDate>,
    expiration_date: Option<NaiveDate>,
    payment_check: Option<&Path>,
) -> Result<u8> {
    let mut app = fetch(ctx, id).await?;
    let mut dialog = ApproveDialog::for_application(&app, Some(&ctx.account));
    if let Some(signature) = signature {
        dialog.set_signature(signature);
    }
    if let Some(date) = start_date {
        dialog.set_start_date(date);
    }
    if let Some(date) = expiration_date {
        dialog.set_expiration_date(date);
    }

    if let Some(path) = payment_check {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading payment check {}", path.display()))?;
        let file_name = file_name_of(path)?;
        UploadPipeline::new(ctx.client.clone())
            .upload(DocumentType::PaymentCheck, Some(id), &file_name, bytes)
            .await?;
        dialog.mark_payment_check_uploaded();
        // The upload does not change the version token, but the record
        // now lists the new document.
        app = fetch(ctx, id).await?;
    }

    let missing = dialog.missing();
    if !missing.is_empty() {
        println!("FAIL: approval of {id} is incomplete");
        for requirement in missing {
            println!("  {requirement}");
        }
        return Ok(1);
    }

    let updated = ctx.workflow().approve(&app, &dialog).await?;
    report_transition(&app, &updated);
    Ok(0)
}

pub(crate) fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

fn report_transition(before: &Application, after: &Application) {
    println!(
        "OK: application {} transitioned {} → {}",
        after.application_id, before.status, after.status
    );
}
