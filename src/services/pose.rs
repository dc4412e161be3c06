// SPDX-License-Identifier: MIT

//! Body-landmark source for video analysis.
//!
//! The pose model and video decoder are an external capability: given a
//! frame, they optionally produce a set of named 2-D landmarks with a
//! visibility score. This module defines the seam (`PoseEngine` /
//! `DetectionStream`) plus two built-in engines: a disabled engine for
//! deployments without a pose backend, and a scripted engine for tests.

use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;

/// Named anatomical points in the fixed landmark vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkKind {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// One landmark position in normalized frame space.
///
/// `x` and `y` are in `[0, 1]` with the origin at the top-left of the
/// frame, so a smaller `y` is higher in the image. `visibility` is the
/// estimator's confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

/// All landmarks detected in a single frame.
#[derive(Debug, Clone, Default)]
pub struct PoseFrame {
    landmarks: HashMap<LandmarkKind, Landmark>,
}

impl PoseFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mainly for scripted frames in tests.
    pub fn with(mut self, kind: LandmarkKind, x: f64, y: f64, visibility: f64) -> Self {
        self.landmarks.insert(kind, Landmark { x, y, visibility });
        self
    }

    pub fn insert(&mut self, kind: LandmarkKind, landmark: Landmark) {
        self.landmarks.insert(kind, landmark);
    }

    pub fn get(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.landmarks.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

impl std::ops::Index<LandmarkKind> for PoseFrame {
    type Output = Landmark;

    fn index(&self, kind: LandmarkKind) -> &Landmark {
        &self.landmarks[&kind]
    }
}

/// Result of running the estimator on one frame.
#[derive(Debug, Clone)]
pub enum Detection {
    /// Landmarks were detected in this frame.
    Pose(PoseFrame),
    /// The estimator found no body in this frame. Treated as "no new
    /// information", never as an error.
    NoDetection,
}

/// Per-video stream of frame detections, in frame order.
pub trait DetectionStream: Send {
    /// Next frame's detection, or `None` at end of video.
    fn next_frame(&mut self) -> Result<Option<Detection>>;
}

/// Video decode + pose estimation backend.
///
/// Implementations open an uploaded video file and yield one detection
/// per decoded frame. Estimation is deterministic per frame with no
/// cross-frame memory.
pub trait PoseEngine: Send + Sync {
    fn open(&self, video_path: &Path) -> Result<Box<dyn DetectionStream>>;
}

// ─── Disabled Engine ─────────────────────────────────────────────

/// Engine for deployments without a pose backend configured.
///
/// Every opened video yields zero frames, so analyses complete with
/// all-default metrics and are reported as having produced no data.
pub struct DisabledPoseEngine;

impl PoseEngine for DisabledPoseEngine {
    fn open(&self, video_path: &Path) -> Result<Box<dyn DetectionStream>> {
        tracing::warn!(
            path = %video_path.display(),
            "No pose backend configured; analysis will produce no data"
        );
        Ok(Box::new(ScriptedStream { frames: vec![] }))
    }
}

// ─── Scripted Engine ─────────────────────────────────────────────

/// Engine that replays a fixed detection script for every video.
///
/// Used by tests to drive the analyzers with synthetic landmark
/// sequences without a real decoder or model.
#[derive(Default)]
pub struct ScriptedPoseEngine {
    script: Vec<Detection>,
}

impl ScriptedPoseEngine {
    pub fn new(script: Vec<Detection>) -> Self {
        Self { script }
    }
}

impl PoseEngine for ScriptedPoseEngine {
    fn open(&self, _video_path: &Path) -> Result<Box<dyn DetectionStream>> {
        let mut frames = self.script.clone();
        frames.reverse();
        Ok(Box::new(ScriptedStream { frames }))
    }
}

struct ScriptedStream {
    /// Remaining frames in reverse order; popped from the back.
    frames: Vec<Detection>,
}

impl DetectionStream for ScriptedStream {
    fn next_frame(&mut self) -> Result<Option<Detection>> {
        Ok(self.frames.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_engine_yields_no_frames() {
        let engine = DisabledPoseEngine;
        let mut stream = engine.open(Path::new("missing.mp4")).unwrap();
        assert!(stream.next_frame().unwrap().is_none());
    }

    #[test]
    fn scripted_engine_replays_in_order() {
        let first = PoseFrame::new().with(LandmarkKind::LeftHip, 0.5, 0.4, 0.9);
        let engine = ScriptedPoseEngine::new(vec![
            Detection::Pose(first),
            Detection::NoDetection,
        ]);

        let mut stream = engine.open(Path::new("any.mp4")).unwrap();

        match stream.next_frame().unwrap() {
            Some(Detection::Pose(pose)) => {
                assert_eq!(pose[LandmarkKind::LeftHip].y, 0.4);
            }
            other => panic!("expected pose frame, got {:?}", other),
        }
        assert!(matches!(
            stream.next_frame().unwrap(),
            Some(Detection::NoDetection)
        ));
        assert!(stream.next_frame().unwrap().is_none());
    }

    #[test]
    fn pose_frame_lookup_misses_are_none() {
        let pose = PoseFrame::new().with(LandmarkKind::LeftElbow, 0.1, 0.2, 0.8);
        assert!(pose.get(LandmarkKind::RightElbow).is_none());
        assert!(pose.get(LandmarkKind::LeftElbow).is_some());
    }
}
