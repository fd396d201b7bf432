use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarnessError {
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Graph construction error: {0}")]
    GraphConstruction(String),

    #[error("Backend acquisition error for target '{target}': {message}")]
    BackendAcquisition { target: String, message: String },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error(
        "Tolerance violation: {violations} of {compared} elements outside tolerance, max deviation {max_deviation}"
    )]
    ToleranceViolation {
        violations: usize,
        compared: usize,
        max_deviation: f64,
    },

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}

impl HarnessError {
    /// Errors that are raised before any backend is touched.
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            HarnessError::InvalidShape(_) | HarnessError::GraphConstruction(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::InvalidShape(_) => "InvalidShape",
            HarnessError::GraphConstruction(_) => "GraphConstructionError",
            HarnessError::BackendAcquisition { .. } => "BackendAcquisitionError",
            HarnessError::Execution(_) => "ExecutionError",
            HarnessError::ToleranceViolation { .. } => "ToleranceViolation",
            HarnessError::BufferSize { .. } => "ExecutionError",
        }
    }
}
