//! Error type for agent setup and the enumeration pass.

use crate::sys::jni;
use crate::sys::jvmti::jvmtiError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("failed to obtain a JVMTI environment (GetEnv returned {0})")]
    GetEnv(jni::jint),

    #[error("{call} failed: {error}")]
    Jvmti { call: &'static str, error: jvmtiError },

    #[error("failed to find jvmti extension function {0}")]
    MissingExtension(&'static str),

    #[error("invalid version number test failed: expected JVMTI_ERROR_UNSUPPORTED_VERSION, got {0}")]
    UnsupportedVersionAccepted(jvmtiError),

    #[error("invalid flags field test failed: expected JVMTI_ERROR_ILLEGAL_ARGUMENT, got {0}")]
    IllegalFlagsAccepted(jvmtiError),

    #[error("iteration of shared caches failed: {0}")]
    IterationFailed(jvmtiError),

    #[error("incorrect number of caches found: expected at least {expected}, found {found}")]
    TooFewCaches { expected: u32, found: u32 },

    #[error("shared caches have already been enumerated in this process")]
    AlreadyEnumerated,
}

impl AgentError {
    /// Status code to hand back to the VM from `Agent_OnLoad`.
    pub fn status(&self) -> jni::jint {
        match self {
            AgentError::GetEnv(code) => *code,
            AgentError::Jvmti { error, .. } => error.0 as jni::jint,
            _ => jni::JNI_ERR,
        }
    }
}
