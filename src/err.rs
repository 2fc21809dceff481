use std::fmt;

pub type AsyncIngressResult<T> = Result<T, AsyncIngressError>;

/// Store write performed by the convergence routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Create,
    Update,
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOperation::Create => f.write_str("create"),
            WriteOperation::Update => f.write_str("update"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AsyncIngressError {
    #[error("Invalid value for key {key}: {value:?}")]
    InvalidMode { key: String, value: String },
    #[error("Failed to {operation} {kind} {namespace}/{name}: {source}")]
    Write {
        operation: WriteOperation,
        kind: String,
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}
