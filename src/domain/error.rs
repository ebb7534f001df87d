// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Configuration errors are raised while building the model,
// shape errors at the first operation that needs the shape,
// data errors while reading dataset or embedding files.
// Everything above the domain layer wraps these in anyhow.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RationaleError {
    #[error("unknown model type '{0}', expected one of RNN, CNN, TRM")]
    UnknownModelType(String),

    #[error("unknown cell type '{0}', expected GRU or LSTM")]
    UnknownCellType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name:     &'static str,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    #[error("{0} guidance is enabled but the batch carries no {0} matrix")]
    MissingGuidance(&'static str),

    #[error("data error: {0}")]
    Data(String),
}

impl RationaleError {
    pub fn shape(name: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            name,
            expected: expected.to_vec(),
            actual:   actual.to_vec(),
        }
    }
}
