//! Raw FFI bindings.
//!
//! - [`jni`]: JNI primitive types and the `JavaVM` invocation table
//! - [`jvmti`]: the JVMTI function table, error codes and event callbacks
//! - [`ibmjvmti`]: OpenJ9 shared classes cache extensions

pub mod jni;
pub mod jvmti;
pub mod ibmjvmti;
