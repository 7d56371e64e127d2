//! # Documents Subcommand
//!
//! Upload a supporting document through a presigned URL, or print a
//! short-lived signed URL for one already stored. Without `--application`
//! the document belongs to the account and is adopted by its next new
//! application.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use pyro_core::{ApplicationId, DocumentType};
use pyro_portal::{UploadPipeline, ViewerKind};

use crate::applications::file_name_of;
use crate::context::{ConnectArgs, PortalContext};

#[derive(Args, Debug)]
pub struct DocumentsArgs {
    #[command(subcommand)]
    pub command: DocumentsCommand,
}

#[derive(Subcommand, Debug)]
pub enum DocumentsCommand {
    /// Upload or replace a document.
    Upload {
        /// Document slot, e.g. `payment_check` or `site_plan`.
        document_type: DocumentType,
        file: PathBuf,
        #[arg(long)]
        application: Option<ApplicationId>,
    },

    /// Print a signed URL for a stored document.
    View {
        document_type: DocumentType,
        #[arg(long)]
        application: Option<ApplicationId>,
    },
}

pub async fn run_documents(args: &DocumentsArgs, connect: &ConnectArgs) -> Result<u8> {
    let ctx = PortalContext::connect(connect).await?;
    let pipeline = UploadPipeline::new(ctx.client.clone());

    match &args.command {
        DocumentsCommand::Upload {
            document_type,
            file,
            application,
        } => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let size = bytes.len();
            let file_name = file_name_of(file)?;
            pipeline
                .upload(*document_type, application.as_ref(), &file_name, bytes)
                .await?;
            println!(
                "OK: uploaded {} as {} ({size} bytes)",
                file_name,
                document_type.label()
            );
            Ok(0)
        }
        DocumentsCommand::View {
            document_type,
            application,
        } => {
            let view = pipeline.view(*document_type, application.as_ref()).await?;
            println!("{}: {}", document_type.label(), view.file_name);
            println!("  Viewer: {}", viewer_name(view.viewer));
            println!("  URL: {}", view.url);
            Ok(0)
        }
    }
}

fn viewer_name(viewer: ViewerKind) -> &'static str {
    match viewer {
        ViewerKind::Image => "image",
        ViewerKind::Pdf => "pdf",
        ViewerKind::Download => "download only",
    }
}
