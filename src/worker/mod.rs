// ABOUTME: Worker loop — claim, heartbeat, invoke the orchestrator, dispatch the outcome
// ABOUTME: Grounded on spec.md §4.9; the teacher's cache/memory.rs background-task shape drives the heartbeat

pub mod http;

use std::sync::Arc;
use std::time::Instant;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::time::interval;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::checkpoint::CheckpointStore;
use crate::config::environment::Timeouts;
use crate::domain::Job;
use crate::errors::AppError;
use crate::notifier::Notifier;
use crate::orchestrator::{Orchestrator, PipelineOutput, TimeBudget};
use crate::plan_store::PlanStore;
use crate::queue::JobQueue;

fn generate_worker_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("worker_{millis}_{suffix}")
}

/// The worker's JSON response envelope (spec.md §6).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    pub yielded: bool,
    pub no_jobs_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationResponse {
    fn no_jobs() -> Self {
        Self {
            success: true,
            job_id: None,
            plan_id: None,
            status: Some("no_jobs"),
            yielded: false,
            no_jobs_available: true,
            error: None,
        }
    }

    fn yielded(job_id: Uuid) -> Self {
        Self {
            success: true,
            job_id: Some(job_id),
            plan_id: None,
            status: Some("yielded"),
            yielded: true,
            no_jobs_available: false,
            error: None,
        }
    }

    fn completed(job_id: Uuid, plan_id: Uuid) -> Self {
        Self {
            success: true,
            job_id: Some(job_id),
            plan_id: Some(plan_id),
            status: Some("completed"),
            yielded: false,
            no_jobs_available: false,
            error: None,
        }
    }

    fn failed(job_id: Option<Uuid>, message: String) -> Self {
        Self {
            success: false,
            job_id,
            plan_id: None,
            status: Some("failed"),
            yielded: false,
            no_jobs_available: false,
            error: Some(message),
        }
    }
}

/// Every collaborator one invocation needs. Cheap to clone — everything is
/// an `Arc` or, for `Timeouts`, `Copy` — so a yielded run can hand a copy to
/// its own self-invocation task (spec.md §4.9 "Yielded").
#[derive(Clone)]
pub struct WorkerDeps {
    pub queue: Arc<dyn JobQueue>,
    pub checkpoint_store: Arc<dyn CheckpointStore>,
    pub plan_store: Arc<dyn PlanStore>,
    pub notifier: Arc<dyn Notifier>,
    pub orchestrator: Arc<Orchestrator>,
    pub timeouts: Timeouts,
}

/// Extends a claimed job's lease on a fixed period until stopped. Mirrors
/// the teacher's `cache/memory.rs` cleanup-task shape: a spawned
/// `tokio::select!` loop over an interval tick and a shutdown signal.
struct Heartbeat {
    stop_tx: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl Heartbeat {
    fn start(queue: Arc<dyn JobQueue>, job_id: Uuid, worker_id: String, timeouts: Timeouts) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(timeouts.heartbeat_period());
            ticker.tick().await; // first tick is immediate; the claim already set the initial lease
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match queue.extend_lease(job_id, &worker_id, timeouts.lease_seconds).await {
                            Ok(true) => {}
                            Ok(false) => {
                                warn!(job_id = %job_id, "lease lost to another worker, stopping heartbeat");
                                break;
                            }
                            Err(e) => warn!(job_id = %job_id, "heartbeat extend_lease failed: {e}"),
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }
        });
        Self { stop_tx, handle }
    }

    /// Stop the ticker and wait for it to exit. Every code path out of
    /// [`run_invocation`] calls this before returning (spec.md §4.9 "Cleanup
    /// on every exit path").
    async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.handle.await;
    }
}

fn time_budget_fn(started: Instant, timeouts: Timeouts) -> impl Fn() -> TimeBudget {
    move || {
        let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        let remaining_ms = i64::try_from(timeouts.invocation_budget_ms).unwrap_or(i64::MAX) - elapsed_ms;
        let should_yield = remaining_ms < i64::try_from(timeouts.yield_threshold_ms).unwrap_or(0);
        TimeBudget { remaining_ms, should_yield }
    }
}

async fn run_pipeline(
    deps: &WorkerDeps,
    job: &Job,
    started: Instant,
) -> Result<PipelineOutput, AppError> {
    if let Some(redo) = &job.redo {
        let previous = deps
            .plan_store
            .load_days(redo.source_plan_id)
            .await?
            .ok_or_else(|| AppError::generation("redo source plan not found"))?;
        deps.orchestrator.run_redo(redo, &previous).await
    } else {
        // The job row's own `checkpoint` column is a snapshot from claim
        // time; the checkpoint store is the authoritative copy once a
        // previous invocation has made progress past it (spec.md §4.9
        // "load the checkpoint").
        let checkpoint = deps
            .checkpoint_store
            .load(job.id)
            .await?
            .or_else(|| job.checkpoint.clone())
            .unwrap_or_default();
        deps.orchestrator
            .run(job.id, &job.profile, checkpoint, time_budget_fn(started, deps.timeouts))
            .await
    }
}

async fn notify_completion(deps: &WorkerDeps, job: &Job, plan_id: Uuid) {
    deps.notifier
        .send(
            job.user_id,
            "Your plan is ready",
            "Your 7-day fitness plan has been generated.",
            serde_json::json!({ "planId": plan_id }),
        )
        .await;
}

async fn notify_failure(deps: &WorkerDeps, job: &Job, error: &AppError) {
    if job.is_final_retry() {
        deps.notifier
            .send(
                job.user_id,
                "We couldn't generate your plan",
                "Something went wrong generating your plan. Please try again.",
                serde_json::json!({ "errorCode": error.code.token() }),
            )
            .await;
    }
}

/// Run one worker invocation to completion: claim at most one job, drive it
/// through the orchestrator, and dispatch the outcome (spec.md §4.9).
///
/// Never returns an `Err` — every failure short-circuits into a `failed`
/// envelope instead, matching the worker's "always answer 200" contract
/// (spec.md §4.9, §6).
pub async fn run_invocation(deps: &WorkerDeps) -> InvocationResponse {
    let worker_id = generate_worker_id();

    let job = match deps.queue.claim(&worker_id, deps.timeouts.lease_seconds).await {
        Ok(Some(job)) => job,
        Ok(None) => return InvocationResponse::no_jobs(),
        Err(e) => {
            error!("job claim failed: {e}");
            return InvocationResponse::failed(None, e.sanitized_message());
        }
    };

    info!(job_id = %job.id, worker_id = %worker_id, "claimed job");
    let heartbeat = Heartbeat::start(deps.queue.clone(), job.id, worker_id.clone(), deps.timeouts);
    let started = Instant::now();

    let plan_id = match deps.plan_store.ensure_generating(&job).await {
        Ok(id) => id,
        Err(e) => {
            heartbeat.stop().await;
            error!(job_id = %job.id, "ensure_generating failed: {e}");
            if let Err(fail_err) = deps.queue.fail(job.id, &e.as_queue_message(), e.code.token()).await {
                warn!(job_id = %job.id, "fail() after ensure_generating error also failed: {fail_err}");
            }
            return InvocationResponse::failed(Some(job.id), e.sanitized_message());
        }
    };

    let outcome = run_pipeline(deps, &job, started).await;

    match outcome {
        Ok(PipelineOutput { yielded: true, .. }) => {
            heartbeat.stop().await;
            if let Err(e) = deps
                .queue
                .shrink_lease(job.id, &worker_id, deps.timeouts.yield_lease_seconds)
                .await
            {
                warn!(job_id = %job.id, "shrink_lease failed on yield: {e}");
            }
            info!(job_id = %job.id, "yielded, scheduling self-invocation");
            let continuation = deps.clone();
            tokio::spawn(async move {
                run_invocation(&continuation).await;
            });
            InvocationResponse::yielded(job.id)
        }
        Ok(PipelineOutput { plan: Some(plan), .. }) => {
            heartbeat.stop().await;
            if let Err(e) = deps.plan_store.save_completed(plan_id, &plan).await {
                error!(job_id = %job.id, "save_completed failed: {e}");
                return finish_with_error(deps, &job, plan_id, e).await;
            }
            if let Err(e) = deps.queue.complete(job.id, plan_id).await {
                error!(job_id = %job.id, "queue.complete failed: {e}");
                return finish_with_error(deps, &job, plan_id, e).await;
            }
            notify_completion(deps, &job, plan_id).await;
            InvocationResponse::completed(job.id, plan_id)
        }
        Ok(PipelineOutput { plan: None, yielded: false }) => {
            heartbeat.stop().await;
            finish_with_error(deps, &job, plan_id, AppError::generation("pipeline produced no plan and did not yield"))
                .await
        }
        Err(e) => {
            heartbeat.stop().await;
            finish_with_error(deps, &job, plan_id, e).await
        }
    }
}

/// Shared terminal-error handling: reset the plan row, record the failure
/// against the job (advancing its retry count or marking it terminal), and
/// notify the user only once retries are exhausted (spec.md §4.9 "Error").
async fn finish_with_error(deps: &WorkerDeps, job: &Job, plan_id: Uuid, e: AppError) -> InvocationResponse {
    error!(job_id = %job.id, "invocation failed: {e}");
    if let Err(reset_err) = deps.plan_store.reset_to_pending(plan_id).await {
        warn!(job_id = %job.id, "reset_to_pending failed: {reset_err}");
    }
    if let Err(fail_err) = deps.queue.fail(job.id, &e.as_queue_message(), e.code.token()).await {
        warn!(job_id = %job.id, "fail() failed: {fail_err}");
    }
    notify_failure(deps, job, &e).await;
    InvocationResponse::failed(Some(job.id), e.sanitized_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_jobs_envelope_matches_the_documented_shape() {
        let response = InvocationResponse::no_jobs();
        let json = serde_json::to_value(&response).expect("serializes");
        assert_eq!(json["success"], true);
        assert_eq!(json["noJobsAvailable"], true);
        assert_eq!(json["status"], "no_jobs");
        assert!(json.get("jobId").is_none());
    }

    #[test]
    fn worker_id_has_the_documented_shape() {
        let id = generate_worker_id();
        assert!(id.starts_with("worker_"));
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 6);
    }

    #[test]
    fn time_budget_yields_once_remaining_drops_below_threshold() {
        let timeouts = Timeouts {
            invocation_budget_ms: 100,
            yield_threshold_ms: 50,
            ..Timeouts::default()
        };
        let budget = time_budget_fn(Instant::now(), timeouts);
        // Elapsed time is ~0ms here, well above the 50ms threshold below budget.
        assert!(!budget().should_yield);
    }
}
