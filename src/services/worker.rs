// SPDX-License-Identifier: MIT

//! Background analysis worker pool.
//!
//! Video decoding and landmark inference are CPU-bound, so they run off
//! the request path: capture handlers enqueue an [`QueuedAnalysis`] and
//! return a job id immediately, and clients poll for completion. Each
//! job carries a cancellation flag checked between frames.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    Exercise, NewLungesLog, NewPlanksLog, NewPullupsLog, NewPushupsLog, NewSquatsLog,
};
use crate::services::analysis::{analyze_stream, AnalysisReport, AnalysisRun};
use crate::services::pose::PoseEngine;
use crate::services::upload::ScratchFile;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// How long a finished job stays pollable before the sweeper drops it.
const JOB_RETENTION_SECS: i64 = 300;

/// How often the background sweeper scans the job store.
const SWEEP_INTERVAL_SECS: u64 = 60;

/// One queued unit of work, including ownership of the scratch video.
pub struct QueuedAnalysis {
    pub job_id: Uuid,
    pub user_id: i64,
    pub exercise: Exercise,
    pub video: ScratchFile,
    pub notes: String,
    pub weight: Option<i64>,
    cancel: Arc<AtomicBool>,
}

/// Lifecycle of an analysis job.
#[derive(Debug, Clone)]
pub enum JobStatus {
    Queued,
    Running,
    Completed {
        report: AnalysisReport,
        log_id: i64,
        /// True when the video produced zero landmark detections; the
        /// persisted record then carries only default/zero metrics.
        no_data: bool,
    },
    Failed {
        error: String,
    },
    Cancelled,
}

impl JobStatus {
    /// Whether the job will never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled
        )
    }
}

/// Job record kept in the in-memory store for polling.
#[derive(Clone)]
pub struct AnalysisJob {
    pub id: Uuid,
    pub user_id: i64,
    pub exercise: Exercise,
    pub submitted_at: DateTime<Utc>,
    pub status: JobStatus,
    /// When the job reached a terminal status; drives sweeper eviction.
    finished_at: Option<DateTime<Utc>>,
    cancel: Arc<AtomicBool>,
}

/// Handle to the worker pool and job store.
#[derive(Clone)]
pub struct AnalysisWorker {
    jobs: Arc<DashMap<Uuid, AnalysisJob>>,
    tx: mpsc::Sender<QueuedAnalysis>,
}

impl AnalysisWorker {
    /// Spawn `workers` background tasks draining a bounded queue.
    pub fn spawn(db: Database, engine: Arc<dyn PoseEngine>, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel::<QueuedAnalysis>(64);
        let rx = Arc::new(Mutex::new(rx));
        let jobs: Arc<DashMap<Uuid, AnalysisJob>> = Arc::new(DashMap::new());

        for worker_id in 0..workers.max(1) {
            tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&rx),
                Arc::clone(&jobs),
                db.clone(),
                Arc::clone(&engine),
            ));
        }

        // Sweeper keeps the job store bounded: finished jobs stay
        // pollable for the retention window, then are dropped.
        {
            let jobs = Arc::clone(&jobs);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                    SWEEP_INTERVAL_SECS,
                ));
                loop {
                    interval.tick().await;
                    sweep_finished(&jobs, chrono::Duration::seconds(JOB_RETENTION_SECS));
                }
            });
        }

        Self { jobs, tx }
    }

    /// Enqueue one analysis; returns the job id for polling.
    pub async fn submit(
        &self,
        user_id: i64,
        exercise: Exercise,
        video: ScratchFile,
        notes: String,
        weight: Option<i64>,
    ) -> Result<Uuid> {
        let job_id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));

        self.jobs.insert(
            job_id,
            AnalysisJob {
                id: job_id,
                user_id,
                exercise,
                submitted_at: Utc::now(),
                status: JobStatus::Queued,
                finished_at: None,
                cancel: Arc::clone(&cancel),
            },
        );

        let queued = QueuedAnalysis {
            job_id,
            user_id,
            exercise,
            video,
            notes,
            weight,
            cancel,
        };

        if self.tx.send(queued).await.is_err() {
            self.jobs.remove(&job_id);
            return Err(AppError::Internal(anyhow::anyhow!(
                "Analysis queue is closed"
            )));
        }

        tracing::info!(job_id = %job_id, user_id, exercise = %exercise, "Analysis queued");
        Ok(job_id)
    }

    /// Look up a job by id.
    pub fn job(&self, job_id: Uuid) -> Option<AnalysisJob> {
        self.jobs.get(&job_id).map(|entry| entry.clone())
    }

    /// Request cancellation. The flag is checked between frames; a job
    /// that already completed is unaffected. Returns false for unknown
    /// job ids.
    pub fn cancel(&self, job_id: Uuid) -> bool {
        match self.jobs.get(&job_id) {
            Some(job) => {
                job.cancel.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Drop finished jobs older than `retention`. Queued and running
    /// jobs are never evicted.
    pub fn evict_finished(&self, retention: chrono::Duration) {
        sweep_finished(&self.jobs, retention);
    }
}

fn sweep_finished(jobs: &DashMap<Uuid, AnalysisJob>, retention: chrono::Duration) {
    let now = Utc::now();
    let before = jobs.len();
    jobs.retain(|_, job| match job.finished_at {
        Some(finished_at) => now - finished_at < retention,
        None => true,
    });
    let evicted = before - jobs.len();
    if evicted > 0 {
        tracing::debug!(evicted, resident = jobs.len(), "Swept finished analysis jobs");
    }
}

async fn run_worker(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<QueuedAnalysis>>>,
    jobs: Arc<DashMap<Uuid, AnalysisJob>>,
    db: Database,
    engine: Arc<dyn PoseEngine>,
) {
    tracing::debug!(worker_id, "Analysis worker started");
    loop {
        let next = { rx.lock().await.recv().await };
        let Some(work) = next else {
            tracing::debug!(worker_id, "Analysis queue closed, worker exiting");
            break;
        };

        process_job(work, &jobs, &db, Arc::clone(&engine)).await;
    }
}

async fn process_job(
    work: QueuedAnalysis,
    jobs: &DashMap<Uuid, AnalysisJob>,
    db: &Database,
    engine: Arc<dyn PoseEngine>,
) {
    let QueuedAnalysis {
        job_id,
        user_id,
        exercise,
        video,
        notes,
        weight,
        cancel,
    } = work;

    let set_status = |status: JobStatus| {
        if let Some(mut job) = jobs.get_mut(&job_id) {
            if status.is_terminal() {
                job.finished_at = Some(Utc::now());
            }
            job.status = status;
        }
    };

    if cancel.load(Ordering::Relaxed) {
        tracing::info!(job_id = %job_id, "Job cancelled before start");
        set_status(JobStatus::Cancelled);
        return;
    }

    set_status(JobStatus::Running);
    tracing::info!(job_id = %job_id, user_id, exercise = %exercise, "Analysis started");

    // Decode + inference are blocking and CPU-bound; keep them off the
    // async executor. The scratch video moves into the closure and is
    // removed when it drops, success or failure.
    let run = tokio::task::spawn_blocking({
        let cancel = Arc::clone(&cancel);
        let notes = notes.clone();
        move || -> Result<AnalysisRun> {
            let mut stream = engine.open(video.path())?;
            analyze_stream(exercise, stream.as_mut(), &notes, weight, &cancel)
        }
    })
    .await;

    let outcome = match run {
        Ok(Ok(AnalysisRun::Completed(outcome))) => outcome,
        Ok(Ok(AnalysisRun::Cancelled)) => {
            tracing::info!(job_id = %job_id, "Analysis cancelled");
            set_status(JobStatus::Cancelled);
            return;
        }
        Ok(Err(e)) => {
            tracing::warn!(job_id = %job_id, error = %e, "Analysis failed");
            set_status(JobStatus::Failed {
                error: e.to_string(),
            });
            return;
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Analysis task panicked");
            set_status(JobStatus::Failed {
                error: "analysis task failed".to_string(),
            });
            return;
        }
    };

    let no_data = outcome.no_data();
    if no_data {
        tracing::warn!(
            job_id = %job_id,
            frames = outcome.frames_total,
            "Analysis produced no data; persisting default record"
        );
    }

    // One atomic insert; the record becomes visible to dashboard
    // queries only after this commits.
    match persist_report(db, user_id, &outcome.report).await {
        Ok(log_id) => {
            tracing::info!(
                job_id = %job_id,
                log_id,
                frames = outcome.frames_total,
                detected = outcome.frames_detected,
                "Analysis complete"
            );
            set_status(JobStatus::Completed {
                report: outcome.report.clone(),
                log_id,
                no_data,
            });
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Failed to persist workout log");
            set_status(JobStatus::Failed {
                error: e.to_string(),
            });
        }
    }
}

/// Insert the report into the matching exercise table.
async fn persist_report(db: &Database, user_id: i64, report: &AnalysisReport) -> Result<i64> {
    let date = Utc::now();
    match report {
        AnalysisReport::Pushups(r) => {
            db.insert_pushups_log(&NewPushupsLog {
                user_id,
                date,
                reps: r.reps,
                sets: r.sets,
                duration: r.duration,
                difficulty: r.difficulty.clone(),
                rest_period: r.rest_period,
                calories_burned: r.calories_burned,
                form_notes: r.form_notes.clone(),
            })
            .await
        }
        AnalysisReport::Squats(r) => {
            db.insert_squats_log(&NewSquatsLog {
                user_id,
                date,
                reps: r.reps,
                sets: r.sets,
                duration: r.duration,
                weight: r.weight,
                rest_period: r.rest_period,
                calories_burned: r.calories_burned,
                depth: r.depth.clone(),
                form_notes: r.form_notes.clone(),
            })
            .await
        }
        AnalysisReport::Planks(r) => {
            db.insert_planks_log(&NewPlanksLog {
                user_id,
                date,
                duration: r.duration,
                stage: r.stage.clone(),
                rest_period: r.rest_period,
                calories_burned: r.calories_burned,
                form_notes: r.form_notes.clone(),
            })
            .await
        }
        AnalysisReport::Lunges(r) => {
            db.insert_lunges_log(&NewLungesLog {
                user_id,
                date,
                reps: r.reps,
                sets: r.sets,
                duration: r.duration,
                weight: r.weight,
                rest_period: r.rest_period,
                calories_burned: r.calories_burned,
                stance: r.stance.clone(),
                form_notes: r.form_notes.clone(),
            })
            .await
        }
        AnalysisReport::Pullups(r) => {
            db.insert_pullups_log(&NewPullupsLog {
                user_id,
                date,
                reps: r.reps,
                sets: r.sets,
                duration: r.duration,
                difficulty: r.difficulty.clone(),
                rest_period: r.rest_period,
                calories_burned: r.calories_burned,
                grip_type: r.grip_type.clone(),
                form_notes: r.form_notes.clone(),
            })
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::services::pose::DisabledPoseEngine;

    async fn test_worker() -> (Database, AnalysisWorker) {
        let db = Database::new_in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let worker = AnalysisWorker::spawn(db.clone(), Arc::new(DisabledPoseEngine), 1);
        (db, worker)
    }

    async fn test_user(db: &Database) -> i64 {
        db.create_user(&NewUser {
            username: "worker_test_user".to_string(),
            email: "worker_test_user@example.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
            age: 30,
            gender: "other".to_string(),
        })
        .await
        .unwrap()
    }

    fn scratch() -> ScratchFile {
        ScratchFile::allocate(&std::env::temp_dir().join("formtrack-worker-test")).unwrap()
    }

    async fn wait_terminal(worker: &AnalysisWorker, job_id: Uuid) {
        for _ in 0..200 {
            if let Some(job) = worker.job(job_id) {
                if job.status.is_terminal() {
                    return;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("job {} never reached a terminal state", job_id);
    }

    #[tokio::test]
    async fn finished_jobs_are_evicted_after_retention() {
        let (db, worker) = test_worker().await;
        let user_id = test_user(&db).await;

        let mut job_ids = Vec::new();
        for _ in 0..5 {
            let id = worker
                .submit(user_id, Exercise::Pushups, scratch(), String::new(), None)
                .await
                .unwrap();
            job_ids.push(id);
        }
        for id in &job_ids {
            wait_terminal(&worker, *id).await;
        }

        // Inside the retention window every finished job stays pollable.
        worker.evict_finished(chrono::Duration::seconds(JOB_RETENTION_SECS));
        assert_eq!(worker.jobs.len(), 5);

        // Past the window the sweep drops them all.
        worker.evict_finished(chrono::Duration::zero());
        assert_eq!(worker.jobs.len(), 0);
        for id in &job_ids {
            assert!(worker.job(*id).is_none());
        }
    }

    #[tokio::test]
    async fn unfinished_jobs_survive_the_sweep() {
        let (_db, worker) = test_worker().await;

        // A job that never started processing has no finished_at.
        let job_id = Uuid::new_v4();
        worker.jobs.insert(
            job_id,
            AnalysisJob {
                id: job_id,
                user_id: 1,
                exercise: Exercise::Squats,
                submitted_at: Utc::now(),
                status: JobStatus::Queued,
                finished_at: None,
                cancel: Arc::new(AtomicBool::new(false)),
            },
        );

        worker.evict_finished(chrono::Duration::zero());
        assert!(worker.job(job_id).is_some());
    }
}
