// SPDX-License-Identifier: MIT

//! Service layer: pose estimation seam, per-exercise analyzers,
//! background worker pool, and upload scratch files.

pub mod analysis;
pub mod pose;
pub mod upload;
pub mod worker;

pub use analysis::{analyze_stream, AnalysisOutcome, AnalysisReport, AnalysisRun};
pub use pose::{Detection, DisabledPoseEngine, PoseEngine, PoseFrame, ScriptedPoseEngine};
pub use upload::ScratchFile;
pub use worker::{AnalysisWorker, JobStatus};
