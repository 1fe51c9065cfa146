//! Error taxonomy surfaced to protocol callers.
//!
//! Operations return `anyhow::Result` and attach context freely; the protocol
//! layer walks the chain with [`classify`] to find the typed [`KernelError`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Unknown tuple id, asset, role, or tool.
    #[error("{0}")]
    NotFound(String),
    /// Unrecognized slot or action, or arguments that fail the tool schema.
    #[error("{0}")]
    InvalidArgument(String),
    /// An external asset directory or metadata source is missing.
    #[error("{0}")]
    UpstreamUnavailable(String),
}

impl KernelError {
    pub fn kind(&self) -> &'static str {
        match self {
            KernelError::NotFound(_) => "not_found",
            KernelError::InvalidArgument(_) => "invalid_argument",
            KernelError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}

/// Find the first typed kernel error anywhere in an error chain.
pub fn classify(err: &anyhow::Error) -> Option<&KernelError> {
    err.chain().find_map(|cause| cause.downcast_ref::<KernelError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classify_sees_through_context() {
        let err = Err::<(), _>(KernelError::NotFound("tuple 'x' not found".to_string()))
            .context("load tuple")
            .unwrap_err();
        let kind = classify(&err).map(KernelError::kind);
        assert_eq!(kind, Some("not_found"));
    }

    #[test]
    fn classify_returns_none_for_untyped_errors() {
        let err = anyhow::anyhow!("disk on fire");
        assert!(classify(&err).is_none());
    }
}
