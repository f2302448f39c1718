// ============================================================================
// worksite: CLI driver for contractor-services completion workflows
// ============================================================================
// Usage:
//   worksite complete-job session.json         Run the job completion chain
//   worksite complete-milestone session.json   Run the milestone chain
//   worksite complete-quotation session.json   Run the quotation chain
//   worksite validate session.json             Offline gate check only
//   worksite preview-payment session.json      Show the derived figures
//
// The remote API endpoint and bearer token come from --api-url/--token or
// the WORKSITE_API_URL / WORKSITE_API_TOKEN environment variables (.env is
// honored).
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use worksite_core::{
    completion_gate, money, CompletionOrchestrator, CompletionOutcome, CompletionSession,
    CompletionVariant, FileDocumentSink, HttpWorkOrderApi, WorkflowError,
};

/// Worksite completion-workflow driver
#[derive(Parser)]
#[command(name = "worksite", version, about = "Run completion workflows against the work-order API")]
struct Cli {
    /// Work-order API root (default: WORKSITE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (default: WORKSITE_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Directory generated documents are saved into
    #[arg(long, global = true, default_value = ".")]
    download_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete a job: status update, payment request, job card
    CompleteJob {
        /// Session file (JSON) holding the completion evidence
        session_file: PathBuf,

        /// Proceed even when some expense slips carry no amount
        #[arg(long)]
        yes: bool,
    },

    /// Complete a milestone (lighter evidentiary bar)
    CompleteMilestone {
        session_file: PathBuf,

        #[arg(long)]
        yes: bool,
    },

    /// Complete a quotation: estimation figures plus order summary
    CompleteQuotation {
        session_file: PathBuf,

        #[arg(long)]
        yes: bool,
    },

    /// Run the completion gate offline without touching the remote API
    Validate { session_file: PathBuf },

    /// Show the material cost and payment amount a completion would submit
    PreviewPayment { session_file: PathBuf },
}

fn load_session(path: &Path, variant: Option<CompletionVariant>) -> Result<CompletionSession> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read session file {}", path.display()))?;
    let mut session: CompletionSession = serde_json::from_str(&raw)
        .with_context(|| format!("invalid session file {}", path.display()))?;
    if let Some(variant) = variant {
        session.variant = variant;
    }
    Ok(session)
}

fn require(value: Option<String>, flag: &str, env_var: &str) -> Result<String> {
    value
        .or_else(|| std::env::var(env_var).ok())
        .ok_or_else(|| anyhow!("missing {}; pass {} or set {}", env_var, flag, env_var))
}

async fn cmd_complete(
    cli: &Cli,
    session_file: &Path,
    variant: CompletionVariant,
    yes: bool,
) -> Result<()> {
    let mut session = load_session(session_file, Some(variant))?;

    // The aggregate silently ignores slips without amounts when a manual
    // override is in play, so that needs explicit consent
    if money::needs_unattributed_confirmation(
        session.evidence.manual_material_cost,
        &session.evidence.expense_records,
    ) && !yes
    {
        anyhow::bail!(
            "some expense slips carry no amount and would be ignored by the manual \
             material cost; re-run with --yes to proceed"
        );
    }

    let api_url = require(cli.api_url.clone(), "--api-url", "WORKSITE_API_URL")?;
    let token = require(cli.token.clone(), "--token", "WORKSITE_API_TOKEN")?;
    let api = HttpWorkOrderApi::new(api_url, token);
    let sink = FileDocumentSink::new(&cli.download_dir);

    let mut orchestrator = CompletionOrchestrator::new(&api, &sink);
    match orchestrator.run(&mut session).await {
        Ok(CompletionOutcome::Completed {
            payment,
            document_path,
        }) => {
            println!("Completed. Payment request {} for {}", payment.id, money::round_display(payment.amount));
            println!("Document saved to {}", document_path.display());
            Ok(())
        }
        Ok(CompletionOutcome::CompletedWithDocumentWarning { payment, warning }) => {
            println!("Completed. Payment request {} for {}", payment.id, money::round_display(payment.amount));
            println!("Warning: document could not be saved ({})", warning);
            Ok(())
        }
        Err(WorkflowError::Validation(violation)) => {
            Err(anyhow!("cannot complete: {}", violation))
        }
        Err(err) => {
            if let Some(step) = err.failed_step() {
                eprintln!(
                    "The {} failed. Steps before it are already committed on the \
                     remote side and will not be re-run on resubmission.",
                    step
                );
            }
            Err(err.into())
        }
    }
}

fn cmd_validate(session_file: &Path) -> Result<()> {
    let session = load_session(session_file, None)?;
    match completion_gate::check_completion(&session) {
        Ok(()) => {
            println!("OK: {:?} completion would pass the gate", session.variant);
            Ok(())
        }
        Err(violation) => Err(anyhow!("gate rejected: {}", violation)),
    }
}

fn cmd_preview_payment(session_file: &Path) -> Result<()> {
    let session = load_session(session_file, None)?;
    let evidence = &session.evidence;

    let material_cost =
        money::compute_material_cost(evidence.manual_material_cost, &evidence.expense_records);
    let payment =
        money::compute_payment_amount(&evidence.payment_basis, session.profile_fallback_rate);
    let rate = money::effective_rate(&evidence.payment_basis, session.profile_fallback_rate);

    println!("Entity:         {}", session.entity_label());
    println!("Material cost:  {}", money::round_display(material_cost));
    println!(
        "Payment:        {} ({:?} x {} at rate {})",
        money::round_display(payment),
        evidence.payment_basis.mode(),
        evidence
            .payment_basis
            .units_worked()
            .unwrap_or_default(),
        rate
    );
    if let Some(estimate) = &session.quotation {
        let labour = money::compute_estimated_labour_cost(
            estimate.num_people_needed,
            estimate.estimated_duration,
            estimate.rate_amount,
        );
        println!("Labour (est.):  {}", money::round_display(labour));
    }
    if money::needs_unattributed_confirmation(
        evidence.manual_material_cost,
        &evidence.expense_records,
    ) {
        println!("Note: slips without amounts are ignored by the manual material cost");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file, if any
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("worksite_core=info")),
        )
        .init();

    let cli = Cli::parse();
    info!("worksite starting");

    match &cli.command {
        Commands::CompleteJob { session_file, yes } => {
            cmd_complete(&cli, session_file, CompletionVariant::Job, *yes).await
        }
        Commands::CompleteMilestone { session_file, yes } => {
            cmd_complete(&cli, session_file, CompletionVariant::Milestone, *yes).await
        }
        Commands::CompleteQuotation { session_file, yes } => {
            cmd_complete(&cli, session_file, CompletionVariant::Quotation, *yes).await
        }
        Commands::Validate { session_file } => cmd_validate(session_file),
        Commands::PreviewPayment { session_file } => cmd_preview_payment(session_file),
    }
}
