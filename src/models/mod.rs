// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod exercise;
pub mod logs;
pub mod user;

pub use exercise::{Exercise, UnknownExercise};
pub use logs::{
    LungesLog, NewLungesLog, NewPlanksLog, NewPullupsLog, NewPushupsLog, NewSquatsLog, PlanksLog,
    PullupsLog, PushupsLog, SquatsLog,
};
pub use user::{NewUser, User};
