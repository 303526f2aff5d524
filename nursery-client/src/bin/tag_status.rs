//! tag-status - bulk tree tag status changes from the command line
//!
//! ```text
//! tag-status <zone> <target-status> [--correction] [--note TEXT] [--yes] [TAG-CODE ...]
//! ```
//!
//! `<zone>` is a zone id or name. Without tag codes every tag in the zone is
//! selected.

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use nursery_client::{
    AutoConfirm, ClientConfig, ConfirmationPrompt, Confirmer, ReportKind, TagStatus,
    TagStatusOrchestrator, TransitionMode, TreeTag, logger,
};
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "tag-status", version, about = "Bulk tree tag status changes")]
struct Args {
    /// Zone id or name
    zone: String,

    /// Target status, e.g. dig_ordered, dug, ready_for_sale
    target: TagStatus,

    /// Tag codes to change (default: every tag in the zone)
    tag_codes: Vec<String>,

    /// Administrative correction: skips prior-status checks, needs --note
    #[arg(long)]
    correction: bool,

    /// Note recorded with every change
    #[arg(long)]
    note: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
}

impl Args {
    fn mode(&self) -> TransitionMode {
        if self.correction {
            TransitionMode::Correction
        } else {
            TransitionMode::Normal
        }
    }
}

/// Map tag codes (case-insensitive) to tag ids, one entry per tag
fn resolve_codes(
    tags: &[TreeTag],
    codes: &[String],
    zone: &str,
) -> anyhow::Result<HashSet<String>> {
    codes
        .iter()
        .map(|code| {
            tags.iter()
                .find(|t| t.tag_code.eq_ignore_ascii_case(code))
                .map(|t| t.id.clone())
                .with_context(|| format!("tag '{}' is not in zone {}", code, zone))
        })
        .collect()
}

/// Reads y/N from stdin
struct StdinConfirm;

#[async_trait]
impl Confirmer for StdinConfirm {
    async fn confirm(&self, prompt: &ConfirmationPrompt) -> bool {
        let message = prompt.message.clone();
        tokio::task::spawn_blocking(move || {
            print!("{} [y/N] ", message);
            let _ = std::io::stdout().flush();
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer).is_ok()
                && matches!(answer.trim(), "y" | "Y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init_logger();

    let args = Args::parse();
    let config = ClientConfig::from_env()?;
    let remote = Arc::new(config.build_supabase_client()?);
    let confirmer: Arc<dyn Confirmer> = if args.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirm)
    };
    let orchestrator = TagStatusOrchestrator::new(remote, &config, confirmer);

    let zones = orchestrator.zones().await?;
    let zone = zones
        .iter()
        .find(|z| z.id == args.zone || z.name.eq_ignore_ascii_case(&args.zone))
        .with_context(|| format!("zone '{}' not found", args.zone))?;
    tracing::info!(zone_id = %zone.id, zone = %zone.name, "Loading zone");

    let tags = orchestrator.load_zone(&zone.id).await?;
    if args.tag_codes.is_empty() {
        orchestrator.select_all().await;
    } else {
        for id in resolve_codes(&tags, &args.tag_codes, &zone.name)? {
            orchestrator.select(&id).await;
        }
    }

    let report = orchestrator
        .request_transition(args.target, args.mode(), args.note.as_deref())
        .await?;

    println!("{}", report.message);
    for sample in &report.sampled_errors {
        println!("  - {}", sample);
    }
    if let Some(notice) = &report.notice {
        println!("{}", notice.message);
    }
    if let Some(err) = &report.reload_error {
        eprintln!("warning: tag list could not be refreshed: {}", err);
    }

    if report.kind == ReportKind::TotalFailure {
        std::process::exit(1);
    }
    Ok(())
}
