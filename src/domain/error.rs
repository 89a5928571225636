// ============================================================
// Layer 3 — Assembly Error Taxonomy
// ============================================================
// Every failure that can stop a model from being assembled.
//
//   Configuration     — unknown variant tag, or a sub-config
//                       value no module can be built from
//   MissingMetadata   — the dataset metadata lacks a vocabulary
//                       or a label field the model needs
//   DimensionMismatch — a module factory rejected the widths
//                       it was handed
//
// All three are raised before any tensor is allocated, so a
// failed assembly never leaves a half-built model behind.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)

use thiserror::Error;

/// Errors raised while planning or assembling a joint model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssemblyError {
    /// Unsupported or malformed variant selection.
    #[error("Unsupported {component} configuration: {reason}")]
    Configuration {
        /// Which part of the model config was rejected
        component: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Absent vocabulary or dimension information.
    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    /// A module factory refused the widths it was given.
    #[error("Dimension mismatch in {module}: {reason}")]
    DimensionMismatch {
        /// The module whose factory rejected the widths
        module: &'static str,
        /// The offending widths
        reason: String,
    },
}

impl AssemblyError {
    /// Create a Configuration error.
    pub fn configuration(component: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            component,
            reason: reason.into(),
        }
    }

    /// Create a MissingMetadata error.
    pub fn missing_metadata(what: impl Into<String>) -> Self {
        Self::MissingMetadata(what.into())
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(module: &'static str, reason: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            module,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_component() {
        let err = AssemblyError::configuration("representation", "unknown variant `rnn`");
        assert_eq!(
            err.to_string(),
            "Unsupported representation configuration: unknown variant `rnn`"
        );

        let err = AssemblyError::missing_metadata("target[1].vocab_size is 0");
        assert_eq!(err.to_string(), "Missing metadata: target[1].vocab_size is 0");

        let err = AssemblyError::dimension_mismatch("decoder", "in_dim_doc = 0");
        assert_eq!(err.to_string(), "Dimension mismatch in decoder: in_dim_doc = 0");
    }
}
