// SPDX-License-Identifier: MIT

//! Per-exercise video analyzers.
//!
//! Each analyzer folds an ordered stream of per-frame detections into
//! one workout report. The shared shape: a wall-clock span between the
//! first and last observed frame (the "duration", independent of frame
//! count or framerate), a single boolean "in active phase" flag, and a
//! handful of exercise-specific accumulators. A repetition is counted
//! on the rising edge of the active-phase predicate only; there is no
//! smoothing or debounce, so a single noisy frame can toggle state.
//!
//! Frames with no detection (or with the required landmarks missing)
//! contribute nothing beyond advancing the clock.

use crate::models::Exercise;
use crate::services::pose::{Detection, DetectionStream, LandmarkKind, PoseFrame};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Rest gap threshold: once a rep has been counted, a gap since the
/// last rep longer than this is reported as the rest period.
const REST_GAP_SECS: i64 = 10;

// ─── Reports ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PushupsReport {
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub difficulty: String,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SquatsReport {
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub weight: Option<i64>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub depth: Option<String>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanksReport {
    pub duration: i64,
    pub stage: Option<String>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LungesReport {
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub weight: Option<i64>,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub stance: Option<String>,
    pub form_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PullupsReport {
    pub reps: i64,
    pub sets: i64,
    pub duration: i64,
    pub difficulty: String,
    pub rest_period: Option<i64>,
    pub calories_burned: Option<f64>,
    pub grip_type: Option<String>,
    pub form_notes: Option<String>,
}

/// Terminal output of one analyzer run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    Pushups(PushupsReport),
    Squats(SquatsReport),
    Planks(PlanksReport),
    Lunges(LungesReport),
    Pullups(PullupsReport),
}

impl AnalysisReport {
    pub fn exercise(&self) -> Exercise {
        match self {
            AnalysisReport::Pushups(_) => Exercise::Pushups,
            AnalysisReport::Squats(_) => Exercise::Squats,
            AnalysisReport::Planks(_) => Exercise::Planks,
            AnalysisReport::Lunges(_) => Exercise::Lunges,
            AnalysisReport::Pullups(_) => Exercise::Pullups,
        }
    }
}

// ─── Shared Clock ────────────────────────────────────────────────

/// Wall-clock span over the observed frames.
#[derive(Debug, Clone, Copy)]
struct FrameClock {
    started_at: DateTime<Utc>,
    last_frame_at: Option<DateTime<Utc>>,
}

impl FrameClock {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            last_frame_at: None,
        }
    }

    /// Record that a frame was observed at `now`. Called for every
    /// frame, detected or not.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_frame_at = Some(now);
    }

    /// Whole seconds between start and the last observed frame; 0 when
    /// no frame was ever observed.
    fn duration_secs(&self) -> i64 {
        self.last_frame_at
            .map(|last| (last - self.started_at).num_seconds())
            .unwrap_or(0)
    }
}

/// Seed the stored form notes from user-entered notes.
fn seed_form_notes(user_notes: &str) -> Option<String> {
    Some(format!("{}; ", user_notes))
}

// ─── Push-ups ────────────────────────────────────────────────────

/// Push-up rep counter.
///
/// Active phase: both elbows above their shoulders in image space
/// (elbow.y < shoulder.y). The flag clears only when both elbows are
/// below both shoulders; the exact-equal case changes nothing.
#[derive(Debug)]
pub struct PushupsAnalyzer {
    clock: FrameClock,
    in_pushup: bool,
    reps: i64,
}

impl PushupsAnalyzer {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            clock: FrameClock::new(started_at),
            in_pushup: false,
            reps: 0,
        }
    }

    pub fn observe(&mut self, detection: Option<&PoseFrame>, now: DateTime<Utc>) {
        self.clock.touch(now);
        let Some(pose) = detection else { return };
        let (Some(l_shoulder), Some(l_elbow), Some(r_shoulder), Some(r_elbow)) = (
            pose.get(LandmarkKind::LeftShoulder),
            pose.get(LandmarkKind::LeftElbow),
            pose.get(LandmarkKind::RightShoulder),
            pose.get(LandmarkKind::RightElbow),
        ) else {
            return;
        };

        if l_elbow.y < l_shoulder.y && r_elbow.y < r_shoulder.y {
            if !self.in_pushup {
                self.reps += 1;
                self.in_pushup = true;
            }
        } else if l_elbow.y > l_shoulder.y && r_elbow.y > r_shoulder.y {
            self.in_pushup = false;
        }
    }

    pub fn finish(self, user_notes: &str) -> PushupsReport {
        PushupsReport {
            reps: self.reps,
            // Every 10 reps make a new set
            sets: self.reps / 10,
            duration: self.clock.duration_secs(),
            difficulty: "Beginner".to_string(),
            rest_period: Some(0),
            calories_burned: Some(self.reps as f64 * 0.1),
            form_notes: seed_form_notes(user_notes),
        }
    }
}

// ─── Squats ──────────────────────────────────────────────────────

/// Squat rep counter with depth classification.
///
/// Reps trigger on left hip.y > left knee.y; the depth label uses the
/// same comparison with the opposite reading ("Above parallel" on the
/// rep-triggering side). The two predicates are mutually inconsistent
/// in the source system and are kept verbatim for compatibility.
#[derive(Debug)]
pub struct SquatsAnalyzer {
    clock: FrameClock,
    in_squat: bool,
    reps: i64,
    last_rep_at: DateTime<Utc>,
    rest_period: i64,
    depth: String,
}

impl SquatsAnalyzer {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            clock: FrameClock::new(started_at),
            in_squat: false,
            reps: 0,
            last_rep_at: started_at,
            rest_period: 0,
            depth: "Parallel".to_string(),
        }
    }

    pub fn observe(&mut self, detection: Option<&PoseFrame>, now: DateTime<Utc>) {
        self.clock.touch(now);
        let Some(pose) = detection else { return };
        let (Some(hip), Some(knee)) = (
            pose.get(LandmarkKind::LeftHip),
            pose.get(LandmarkKind::LeftKnee),
        ) else {
            return;
        };

        self.depth = if hip.y > knee.y {
            "Above parallel".to_string()
        } else if hip.y < knee.y {
            "Below parallel".to_string()
        } else {
            "Parallel".to_string()
        };

        if hip.y > knee.y {
            if !self.in_squat {
                self.reps += 1;
                self.in_squat = true;
                self.last_rep_at = now;
            }
        } else {
            self.in_squat = false;
        }

        // Recomputed every detected frame; only the final value survives.
        let gap = (now - self.last_rep_at).num_seconds();
        if self.reps > 0 && gap > REST_GAP_SECS {
            self.rest_period = gap;
        } else {
            self.rest_period = 0;
        }
    }

    pub fn finish(self, user_notes: &str, weight: Option<i64>) -> SquatsReport {
        SquatsReport {
            reps: self.reps,
            sets: 1,
            duration: self.clock.duration_secs(),
            weight,
            rest_period: Some(self.rest_period),
            calories_burned: Some(self.reps as f64 * 0.15),
            depth: Some(self.depth),
            form_notes: seed_form_notes(user_notes),
        }
    }
}

// ─── Planks ──────────────────────────────────────────────────────

/// Plank hold tracker. No reps; the stage label follows the last
/// frame's elbow visibility, and duration/rest/calories are recomputed
/// on every frame from cumulative elapsed time.
#[derive(Debug)]
pub struct PlanksAnalyzer {
    clock: FrameClock,
    in_plank: bool,
    stage: String,
    duration: i64,
    rest_period: i64,
    calories_burned: f64,
}

impl PlanksAnalyzer {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            clock: FrameClock::new(started_at),
            in_plank: false,
            stage: "Forearm plank".to_string(),
            duration: 0,
            rest_period: 0,
            calories_burned: 0.0,
        }
    }

    pub fn observe(&mut self, detection: Option<&PoseFrame>, now: DateTime<Utc>) {
        self.clock.touch(now);

        if let Some(pose) = detection {
            if let (Some(l_elbow), Some(r_elbow)) = (
                pose.get(LandmarkKind::LeftElbow),
                pose.get(LandmarkKind::RightElbow),
            ) {
                if l_elbow.visibility > 0.5 && r_elbow.visibility > 0.5 {
                    self.in_plank = true;
                    self.stage = "Forearm plank".to_string();
                } else {
                    self.in_plank = false;
                    self.stage = "Side plank".to_string();
                }
            }
        }

        // Recomputed every frame regardless of detection.
        self.duration = (now - self.clock.started_at).num_seconds();
        self.rest_period = if self.in_plank { 0 } else { self.duration };
        self.calories_burned = self.duration as f64 * 0.12;
    }

    pub fn finish(self, user_notes: &str) -> PlanksReport {
        PlanksReport {
            duration: self.duration,
            stage: Some(self.stage),
            rest_period: Some(self.rest_period),
            calories_burned: Some(self.calories_burned),
            form_notes: seed_form_notes(user_notes),
        }
    }
}

// ─── Lunges ──────────────────────────────────────────────────────

/// Lunge rep counter with stance classification from the horizontal
/// hip/knee relationship.
#[derive(Debug)]
pub struct LungesAnalyzer {
    clock: FrameClock,
    in_lunge: bool,
    reps: i64,
    last_rep_at: DateTime<Utc>,
    rest_period: i64,
    stance: String,
}

impl LungesAnalyzer {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            clock: FrameClock::new(started_at),
            in_lunge: false,
            reps: 0,
            last_rep_at: started_at,
            rest_period: 0,
            stance: "Forward Lunge".to_string(),
        }
    }

    pub fn observe(&mut self, detection: Option<&PoseFrame>, now: DateTime<Utc>) {
        self.clock.touch(now);
        let Some(pose) = detection else { return };
        let (Some(hip), Some(knee)) = (
            pose.get(LandmarkKind::LeftHip),
            pose.get(LandmarkKind::LeftKnee),
        ) else {
            return;
        };

        self.stance = if hip.x > knee.x {
            "Forward Lunge".to_string()
        } else {
            "Reverse Lunge".to_string()
        };

        if knee.y < hip.y {
            if !self.in_lunge {
                self.reps += 1;
                self.in_lunge = true;
                self.last_rep_at = now;
            }
        } else {
            self.in_lunge = false;
        }

        let gap = (now - self.last_rep_at).num_seconds();
        if self.reps > 0 && gap > REST_GAP_SECS {
            self.rest_period = gap;
        } else {
            self.rest_period = 0;
        }
    }

    pub fn finish(self, user_notes: &str, weight: Option<i64>) -> LungesReport {
        LungesReport {
            reps: self.reps,
            sets: 1,
            duration: self.clock.duration_secs(),
            weight,
            rest_period: Some(self.rest_period),
            calories_burned: Some(self.reps as f64 * 0.2),
            stance: Some(self.stance),
            form_notes: seed_form_notes(user_notes),
        }
    }
}

// ─── Pull-ups ────────────────────────────────────────────────────

/// Pull-up rep counter. Active phase requires the strict vertical
/// ordering wrist above elbow above shoulder on the left side. Unlike
/// squats and lunges, the rest period is never reset once written.
#[derive(Debug)]
pub struct PullupsAnalyzer {
    clock: FrameClock,
    in_pull: bool,
    reps: i64,
    last_rep_at: DateTime<Utc>,
    rest_period: i64,
}

impl PullupsAnalyzer {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            clock: FrameClock::new(started_at),
            in_pull: false,
            reps: 0,
            last_rep_at: started_at,
            rest_period: 0,
        }
    }

    pub fn observe(&mut self, detection: Option<&PoseFrame>, now: DateTime<Utc>) {
        self.clock.touch(now);
        let Some(pose) = detection else { return };
        let (Some(wrist), Some(elbow), Some(shoulder)) = (
            pose.get(LandmarkKind::LeftWrist),
            pose.get(LandmarkKind::LeftElbow),
            pose.get(LandmarkKind::LeftShoulder),
        ) else {
            return;
        };

        if wrist.y < elbow.y && elbow.y < shoulder.y {
            if !self.in_pull {
                self.reps += 1;
                self.in_pull = true;
                self.last_rep_at = now;
            }
        } else {
            self.in_pull = false;
        }

        let gap = (now - self.last_rep_at).num_seconds();
        if self.reps > 0 && gap > REST_GAP_SECS {
            self.rest_period = gap;
        }
    }

    pub fn finish(self, user_notes: &str) -> PullupsReport {
        PullupsReport {
            reps: self.reps,
            sets: 1,
            duration: self.clock.duration_secs(),
            difficulty: "Moderate".to_string(),
            rest_period: Some(self.rest_period),
            calories_burned: Some(self.reps as f64 * 0.12),
            grip_type: Some("Neutral".to_string()),
            form_notes: seed_form_notes(user_notes),
        }
    }
}

// ─── Stream Driver ───────────────────────────────────────────────

enum Analyzer {
    Pushups(PushupsAnalyzer),
    Squats(SquatsAnalyzer),
    Planks(PlanksAnalyzer),
    Lunges(LungesAnalyzer),
    Pullups(PullupsAnalyzer),
}

impl Analyzer {
    fn new(exercise: Exercise, started_at: DateTime<Utc>) -> Self {
        match exercise {
            Exercise::Pushups => Analyzer::Pushups(PushupsAnalyzer::new(started_at)),
            Exercise::Squats => Analyzer::Squats(SquatsAnalyzer::new(started_at)),
            Exercise::Planks => Analyzer::Planks(PlanksAnalyzer::new(started_at)),
            Exercise::Lunges => Analyzer::Lunges(LungesAnalyzer::new(started_at)),
            Exercise::Pullups => Analyzer::Pullups(PullupsAnalyzer::new(started_at)),
        }
    }

    fn observe(&mut self, detection: Option<&PoseFrame>, now: DateTime<Utc>) {
        match self {
            Analyzer::Pushups(a) => a.observe(detection, now),
            Analyzer::Squats(a) => a.observe(detection, now),
            Analyzer::Planks(a) => a.observe(detection, now),
            Analyzer::Lunges(a) => a.observe(detection, now),
            Analyzer::Pullups(a) => a.observe(detection, now),
        }
    }

    fn finish(self, user_notes: &str, weight: Option<i64>) -> AnalysisReport {
        match self {
            Analyzer::Pushups(a) => AnalysisReport::Pushups(a.finish(user_notes)),
            Analyzer::Squats(a) => AnalysisReport::Squats(a.finish(user_notes, weight)),
            Analyzer::Planks(a) => AnalysisReport::Planks(a.finish(user_notes)),
            Analyzer::Lunges(a) => AnalysisReport::Lunges(a.finish(user_notes, weight)),
            Analyzer::Pullups(a) => AnalysisReport::Pullups(a.finish(user_notes)),
        }
    }
}

/// Completed analysis with detection counts for the no-data flag.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub frames_total: u32,
    pub frames_detected: u32,
}

impl AnalysisOutcome {
    /// True when the video produced zero landmark detections; the
    /// report then carries only default/zero metrics.
    pub fn no_data(&self) -> bool {
        self.frames_detected == 0
    }
}

/// Result of driving one detection stream to completion.
#[derive(Debug)]
pub enum AnalysisRun {
    Completed(Box<AnalysisOutcome>),
    Cancelled,
}

/// Fold a detection stream through the analyzer for `exercise`.
///
/// Never errors for an empty or all-`NoDetection` stream: all counters
/// stay at their initial values and duration covers the observed span.
/// The cancel flag is checked between frames to bound wasted work when
/// the client has gone away.
pub fn analyze_stream(
    exercise: Exercise,
    stream: &mut dyn DetectionStream,
    user_notes: &str,
    weight: Option<i64>,
    cancel: &AtomicBool,
) -> crate::error::Result<AnalysisRun> {
    let started_at = Utc::now();
    let mut analyzer = Analyzer::new(exercise, started_at);
    let mut frames_total: u32 = 0;
    let mut frames_detected: u32 = 0;

    while let Some(detection) = stream.next_frame()? {
        if cancel.load(Ordering::Relaxed) {
            return Ok(AnalysisRun::Cancelled);
        }

        frames_total += 1;
        let now = Utc::now();
        match detection {
            Detection::Pose(pose) => {
                frames_detected += 1;
                analyzer.observe(Some(&pose), now);
            }
            Detection::NoDetection => analyzer.observe(None, now),
        }
    }

    Ok(AnalysisRun::Completed(Box::new(AnalysisOutcome {
        report: analyzer.finish(user_notes, weight),
        frames_total,
        frames_detected,
    })))
}
