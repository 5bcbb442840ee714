use nova_decomp_text::TextError;
use thiserror::Error;

pub type Result<T, E = EmitError> = std::result::Result<T, E>;

/// Internal-consistency faults raised while rendering a tree. Any of these aborts the
/// decompilation of the enclosing method.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("explicit invocation of <clinit> on {class}")]
    ClassInitInvocation { class: String },
    #[error("constant of type {ty} has no literal form")]
    InvalidConstantType { ty: String },
    #[error("malformed {kind} node: {reason}")]
    MalformedNode { kind: &'static str, reason: String },
    #[error(transparent)]
    Text(#[from] TextError),
}

impl EmitError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        EmitError::MalformedNode {
            kind,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid decompiler options: {0}")]
    Toml(#[from] toml::de::Error),
}
