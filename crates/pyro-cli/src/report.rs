//! # Render and Metrics Subcommands
//!
//! `render` prints the permit or license layout of one application, either
//! as print markup or with CSS classes. `metrics` prints the dashboard
//! counts, always fetched fresh.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pyro_client::{ApplicationMetrics, RequestOptions};
use pyro_core::ApplicationId;
use pyro_render::RenderMode;
use pyro_state::ApplicationStatus;

use crate::context::{ConnectArgs, PortalContext};

#[derive(Args, Debug)]
pub struct RenderArgs {
    pub id: ApplicationId,

    /// Emit CSS-class markup instead of print markup.
    #[arg(long)]
    pub css: bool,

    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    pub fn mode(&self) -> RenderMode {
        if self.css {
            RenderMode::Css
        } else {
            RenderMode::Print
        }
    }
}

#[derive(Args, Debug)]
pub struct MetricsArgs {
    #[arg(long)]
    pub json: bool,
}

pub async fn run_render(args: &RenderArgs, connect: &ConnectArgs) -> Result<u8> {
    let ctx = PortalContext::connect(connect).await?;
    let app = ctx
        .client
        .applications()
        .get(&args.id, RequestOptions::silent())
        .await
        .with_context(|| format!("loading application {}", args.id))?;
    let markup = pyro_render::render(&app, args.mode())?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &markup)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("OK: wrote {} {} to {}", app.application_type, args.id, path.display());
        }
        None => println!("{markup}"),
    }
    Ok(0)
}

pub async fn run_metrics(args: &MetricsArgs, connect: &ConnectArgs) -> Result<u8> {
    let ctx = PortalContext::connect(connect).await?;
    let metrics = ctx
        .client
        .applications()
        .metrics(RequestOptions::default())
        .await
        .context("loading metrics")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", format_metrics(&metrics));
    }
    Ok(0)
}

/// Every status is listed, including those with no applications.
fn format_metrics(metrics: &ApplicationMetrics) -> String {
    let mut out = format!("Total: {}\n", metrics.total);
    for status in ApplicationStatus::ALL {
        out.push_str(&format!("  {:<11}{}\n", status.as_str(), metrics.count(*status)));
    }
    for (application_type, count) in &metrics.by_type {
        out.push_str(&format!("  {:<11}{}\n", application_type.as_str(), count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyro_core::ApplicationType;

    #[test]
    fn css_flag_selects_mode() {
        let mut args = RenderArgs {
            id: ApplicationId::new("app-1").unwrap(),
            css: false,
            output: None,
        };
        assert_eq!(args.mode(), RenderMode::Print);
        args.css = true;
        assert_eq!(args.mode(), RenderMode::Css);
    }

    #[test]
    fn metrics_list_zero_counts() {
        let mut metrics = ApplicationMetrics {
            total: 3,
            ..Default::default()
        };
        metrics.by_status.insert(ApplicationStatus::Submitted, 2);
        metrics.by_status.insert(ApplicationStatus::Approved, 1);
        metrics.by_type.insert(ApplicationType::Permit, 3);

        let text = format_metrics(&metrics);
        assert!(text.starts_with("Total: 3\n"));
        assert!(text.contains("  submitted  2\n"));
        assert!(text.contains("  rejected   0\n"));
        assert!(text.contains("  permit     3\n"));
        assert_eq!(text.lines().count(), 1 + ApplicationStatus::ALL.len() + 1);
    }
}
