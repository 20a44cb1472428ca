//! Submission state shared between the analysis client and the presentation layer.

use serde::{Deserialize, Serialize};

/// Whether a submission is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    /// Ready to accept a submission.
    #[default]
    Idle,
    /// A submission is being encoded or awaiting the service.
    Loading,
}

impl SubmissionState {
    /// Whether submit controls should be enabled.
    #[must_use]
    pub fn can_submit(self) -> bool {
        self == Self::Idle
    }

    /// Label for the submit control.
    #[must_use]
    pub fn submit_label(self) -> &'static str {
        match self {
            Self::Idle => "Calculate",
            Self::Loading => "Calculating...",
        }
    }
}
