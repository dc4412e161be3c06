// SPDX-License-Identifier: MIT

//! Exercise kinds supported by the video analyzers.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The five exercise types with a workout log table and an analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    Pushups,
    Squats,
    Planks,
    Lunges,
    Pullups,
}

impl Exercise {
    pub const ALL: [Exercise; 5] = [
        Exercise::Pushups,
        Exercise::Squats,
        Exercise::Planks,
        Exercise::Lunges,
        Exercise::Pullups,
    ];

    /// URL path segment for this exercise.
    pub fn slug(self) -> &'static str {
        match self {
            Exercise::Pushups => "pushups",
            Exercise::Squats => "squats",
            Exercise::Planks => "planks",
            Exercise::Lunges => "lunges",
            Exercise::Pullups => "pullups",
        }
    }

    /// Whether the capture form accepts a weight field.
    ///
    /// Planks accept the field for consistency with the capture form but
    /// the value is not stored, matching the plank log schema.
    pub fn accepts_weight(self) -> bool {
        matches!(
            self,
            Exercise::Squats | Exercise::Planks | Exercise::Lunges
        )
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error for unknown exercise names in URLs.
#[derive(Debug, thiserror::Error)]
#[error("Invalid exercise")]
pub struct UnknownExercise;

impl FromStr for Exercise {
    type Err = UnknownExercise;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pushups" => Ok(Exercise::Pushups),
            "squats" => Ok(Exercise::Squats),
            "planks" => Ok(Exercise::Planks),
            "lunges" => Ok(Exercise::Lunges),
            "pullups" => Ok(Exercise::Pullups),
            _ => Err(UnknownExercise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_round_trips() {
        for exercise in Exercise::ALL {
            assert_eq!(exercise.slug().parse::<Exercise>().unwrap(), exercise);
        }
    }

    #[test]
    fn unknown_names_rejected() {
        assert!("burpees".parse::<Exercise>().is_err());
        assert!("Pushups".parse::<Exercise>().is_err());
        assert!("".parse::<Exercise>().is_err());
    }

    #[test]
    fn weight_field_matches_capture_forms() {
        assert!(!Exercise::Pushups.accepts_weight());
        assert!(Exercise::Squats.accepts_weight());
        assert!(Exercise::Planks.accepts_weight());
        assert!(Exercise::Lunges.accepts_weight());
        assert!(!Exercise::Pullups.accepts_weight());
    }
}
