//! Concurrent batch evaluation.
//!
//! Each case runs the full grading lifecycle (start → complete → respond →
//! finalize) against an injected registry and model client. A semaphore
//! caps in-flight cases; outcomes come back in dataset order regardless of
//! completion order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use deckeval_client::{Capability, ImageAttachment, ModelClient};
use deckeval_core::{Message, SessionRegistry};

use crate::dataset::EvalCase;
use crate::paths::resolve_image_paths;
use crate::prompt::build_prompt;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Dataset file the cases came from, for relative image resolution.
    pub dataset_path: PathBuf,
    /// Extra search root for relative image paths.
    pub image_root: Option<PathBuf>,
    /// Concurrency ceiling for in-flight cases.
    pub max_concurrent: usize,
}

/// Grading result for one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub data_id: Option<String>,
    pub instance_id: String,
    pub reward: f64,
    pub verdict: String,
    pub response: String,
    /// Client/transport failure, if the model response never arrived.
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    pub mean_reward: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<CaseOutcome>,
    pub summary: RunSummary,
}

/// Run every case and collect outcomes in dataset order.
pub async fn run_cases(
    client: Arc<dyn ModelClient>,
    registry: Arc<SessionRegistry>,
    cases: Vec<EvalCase>,
    options: &RunOptions,
) -> RunReport {
    let total = cases.len();
    let semaphore = Arc::new(Semaphore::new(options.max_concurrent.max(1)));
    let options = Arc::new(options.clone());
    let mut tasks = JoinSet::new();

    for (index, case) in cases.into_iter().enumerate() {
        let client = client.clone();
        let registry = registry.clone();
        let semaphore = semaphore.clone();
        let options = options.clone();

        tasks.spawn(async move {
            // Closed only on shutdown, which doesn't happen mid-run.
            let _permit = semaphore.acquire_owned().await.expect("semaphore open");
            let outcome = run_case(client.as_ref(), &registry, &case, &options).await;
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<CaseOutcome>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => warn!(error = %e, "evaluation task panicked"),
        }
    }
    let outcomes: Vec<CaseOutcome> = slots.into_iter().flatten().collect();

    let summary = summarize(&outcomes);
    RunReport { outcomes, summary }
}

async fn run_case(
    client: &dyn ModelClient,
    registry: &SessionRegistry,
    case: &EvalCase,
    options: &RunOptions,
) -> CaseOutcome {
    let started_at = Utc::now();
    let instance_id = registry
        .start(None, case.ground_truth.clone())
        .await;

    let attachments = if client.capability() == Capability::Multimodal {
        load_attachments(case, options)
    } else {
        Vec::new()
    };

    let mut conversation = vec![Message::user(build_prompt(&case.question))];

    let outcome = match client.complete(&conversation, &attachments).await {
        Ok(text) => {
            conversation.push(Message::assistant(text.clone()));
            match registry.respond(&instance_id, &conversation).await {
                Ok(turn) => CaseOutcome {
                    data_id: case.data_id.clone(),
                    instance_id: instance_id.clone(),
                    reward: turn.reward,
                    verdict: turn.message,
                    response: text,
                    error: None,
                    started_at,
                    finished_at: Utc::now(),
                },
                Err(e) => failure_outcome(case, &instance_id, started_at, e.to_string()),
            }
        }
        Err(e) => {
            warn!(data_id = ?case.data_id, error = %e, "model completion failed");
            failure_outcome(case, &instance_id, started_at, e.to_string())
        }
    };

    registry.finalize(&instance_id).await;
    debug!(data_id = ?case.data_id, reward = outcome.reward, "case graded");
    outcome
}

fn failure_outcome(
    case: &EvalCase,
    instance_id: &str,
    started_at: DateTime<Utc>,
    error: String,
) -> CaseOutcome {
    CaseOutcome {
        data_id: case.data_id.clone(),
        instance_id: instance_id.to_string(),
        reward: 0.0,
        verdict: "Incorrect.".to_string(),
        response: String::new(),
        error: Some(error),
        started_at,
        finished_at: Utc::now(),
    }
}

/// Read and encode the case's images. Unreadable files are skipped with a
/// warning, matching the loader's skip-don't-fail policy.
fn load_attachments(case: &EvalCase, options: &RunOptions) -> Vec<ImageAttachment> {
    let resolved = resolve_image_paths(
        &options.dataset_path,
        &case.images,
        options.image_root.as_deref(),
    );

    let mut attachments = Vec::new();
    for path in resolved {
        match std::fs::read(&path) {
            Ok(bytes) => attachments.push(ImageAttachment {
                media_type: media_type_for(&path),
                base64: BASE64.encode(bytes),
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable image"),
        }
    }
    attachments
}

fn media_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/png",
    }
    .to_string()
}

fn summarize(outcomes: &[CaseOutcome]) -> RunSummary {
    let total = outcomes.len();
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    let (mean_reward, accuracy) = if total == 0 {
        (0.0, 0.0)
    } else {
        let sum: f64 = outcomes.iter().map(|o| o.reward).sum();
        let correct = outcomes.iter().filter(|o| o.reward >= 1.0).count();
        (sum / total as f64, correct as f64 / total as f64)
    };
    RunSummary {
        total,
        failed,
        mean_reward,
        accuracy,
    }
}

/// Write per-case outcomes as JSONL, plus an aggregate summary alongside.
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    use std::io::Write as _;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for outcome in &report.outcomes {
        serde_json::to_writer(&mut file, outcome)?;
        writeln!(file)?;
    }

    let summary_path = path.with_extension("summary.json");
    let summary = serde_json::to_string_pretty(&report.summary)?;
    std::fs::write(&summary_path, summary)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    Ok(())
}
