use thiserror::Error;

/// Errors reported by the dynamics integrator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DynamicsError {
    /// Time step was zero, negative, NaN or infinite
    #[error("Invalid time step: {0}")]
    InvalidTimestep(f64),

    /// Integration produced NaN or infinite values; the previous state was kept
    #[error("Integration diverged in {component}")]
    Diverged {
        /// State component that went non-finite
        component: &'static str,
    },
}

/// Result type for dynamics operations
pub type DynamicsResult<T> = Result<T, DynamicsError>;
