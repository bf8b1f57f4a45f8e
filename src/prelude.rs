//! Common imports for driving the agent from Rust.
//!
//! This prelude is intentionally small: the agent, its options, and the
//! host seam needed to run a pass against something other than a live VM.

pub use crate::agent::SharedCachesAgent;
pub use crate::enumerate::{CacheEnumerator, PassReport};
pub use crate::error::AgentError;
pub use crate::host::{CacheRecord, CacheType, CacheVisitor, DestroyFailure, SharedCacheHost};
pub use crate::options::AgentOptions;
pub use crate::sys::{jni, jvmti};
pub use crate::Agent;
