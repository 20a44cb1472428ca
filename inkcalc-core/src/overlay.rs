//! The result overlay and the analysis result it presents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parsed result of one analysis: the recognised expression and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The expression the service recognised.
    pub expression: String,
    /// The evaluated result.
    pub value: String,
}

impl AnalysisResult {
    /// Create a result.
    #[must_use]
    pub fn new(expression: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            value: value.into(),
        }
    }

    /// The two display lines, expression first.
    #[must_use]
    pub fn lines(&self) -> [String; 2] {
        [
            format!("Expression: {}", self.expression),
            format!("Result: {}", self.value),
        ]
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [expression, value] = self.lines();
        write!(f, "{expression}\n{value}")
    }
}

/// Holds at most one [`AnalysisResult`] for display.
#[derive(Debug, Clone, Default)]
pub struct ResultOverlay {
    current: Option<AnalysisResult>,
}

impl ResultOverlay {
    /// Create an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is shown with `result`.
    pub fn show(&mut self, result: AnalysisResult) {
        tracing::debug!("Overlay showing {:?}", result.expression);
        self.current = Some(result);
    }

    /// Hide the overlay. Returns the result that was shown.
    pub fn dismiss(&mut self) -> Option<AnalysisResult> {
        self.current.take()
    }

    /// The result on display, if any.
    #[must_use]
    pub fn current(&self) -> Option<&AnalysisResult> {
        self.current.as_ref()
    }

    /// Whether anything is on display.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }
}
