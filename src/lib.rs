//! # sharedcache-agent
//!
//! A JVMTI agent that exercises the OpenJ9 extension functions for querying
//! and deleting shared classes caches.
//!
//! When the VM loads the agent it parses the option string and registers
//! for the `VMInit` event. Once the VM is initialised the agent:
//!
//! 1. looks up `com.ibm.IterateSharedCaches` and `com.ibm.DestroySharedCache`
//!    in the VM's extension function table,
//! 2. checks that iterate rejects an unsupported version with
//!    `JVMTI_ERROR_UNSUPPORTED_VERSION`, and an illegal flags value with
//!    `JVMTI_ERROR_ILLEGAL_ARGUMENT`,
//! 3. iterates over every cache for real, optionally deleting the ones that
//!    match `cachePrefix`,
//! 4. checks that at least `expectedCacheCount` caches were found.
//!
//! Progress is written to stdout as timestamped lines, ending in either
//! `Iterating over caches: SUCCESS` or `Iterating over caches: ERROR`.
//!
//! ## Running
//!
//! ```bash
//! cargo build --release
//! java -Xshareclasses:cacheDir=/tmp/sc,name=wl_1 \
//!      -agentpath:./target/release/libsharedcache_agent.so=cacheDir=/tmp/sc,expectedCacheCount=4,deleteCaches=true,cachePrefix=wl_ \
//!      -version
//! ```
//!
//! See [`options`] for the full list of agent options.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │   Agent_OnLoad / Agent_OnUnload  (export_agent!)         │
//! ├─────────────────────────────────────────────────────────┤
//! │   agent::SharedCachesAgent   options::AgentOptions       │
//! ├─────────────────────────────────────────────────────────┤
//! │   enumerate::CacheEnumerator                             │
//! │        │  host::SharedCacheHost (trait)                  │
//! │        ▼                                                 │
//! │   host::JvmtiSharedCaches  ──  jvmti_wrapper::Jvmti      │
//! ├─────────────────────────────────────────────────────────┤
//! │   sys::{jni, jvmti, ibmjvmti}  raw FFI                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The enumerator only sees the [`host::SharedCacheHost`] trait, so the
//! whole pass can be driven by a fake host in tests.

pub mod sys;
pub mod error;
pub mod logging;
pub mod options;
pub mod host;
pub mod enumerate;
pub mod agent;
pub mod prelude;

#[doc(hidden)]
pub mod jvmti_wrapper;

use std::sync::OnceLock;
pub use crate::sys::jni as jni;
use crate::sys::jvmti as jvmti;
pub use crate::jvmti_wrapper::Jvmti;

/// Lifecycle hooks a JVMTI agent can implement.
///
/// Use [`export_agent!`] to generate the `Agent_OnLoad` / `Agent_OnUnload`
/// entry points for an implementation.
///
/// # Thread Safety
///
/// Your agent must be `Sync + Send` because JVMTI events can fire from any thread.
pub trait Agent: Sync + Send {
    /// Called when the agent is loaded into the JVM.
    ///
    /// Return `JNI_OK` (0) on success; anything else makes the VM abort
    /// startup.
    fn on_load(&self, vm: *mut jni::JavaVM, options: &str) -> jni::jint;

    /// Called when the agent is unloaded (JVM shutdown).
    fn on_unload(&self) {}

    /// Called once the VM has finished initialising, if the agent enabled
    /// `JVMTI_EVENT_VM_INIT` and installed [`lifecycle_callbacks`].
    fn vm_init(&self, _jvmti: &Jvmti, _jni: *mut jni::JNIEnv, _thread: jni::jthread) {}
}

// Holds the agent instance so the static C callbacks can find it.
pub static GLOBAL_AGENT: OnceLock<Box<dyn Agent>> = OnceLock::new();

/// Helper to initialize the global agent (called by the macro)
pub fn set_global_agent(agent: Box<dyn Agent>) -> Result<(), ()> {
    GLOBAL_AGENT.set(agent).map_err(|_| ())
}

unsafe extern "system" fn trampoline_vm_init(env: *mut jvmti::jvmtiEnv, jni: *mut jni::JNIEnv, thread: jni::jthread) {
    if env.is_null() {
        return;
    }
    if let Some(agent) = GLOBAL_AGENT.get() {
        let jvmti_env = Jvmti::from_raw(env);
        agent.vm_init(&jvmti_env, jni, thread);
    }
}

/// Event callbacks that route `VMInit` to the global agent.
pub fn lifecycle_callbacks() -> jvmti::jvmtiEventCallbacks {
    jvmti::jvmtiEventCallbacks {
        VMInit: Some(trampoline_vm_init),
    }
}

/// Exports an agent type as a loadable JVMTI agent library.
///
/// Generates `Agent_OnLoad`, which creates the agent with `Default`,
/// registers it globally and calls [`Agent::on_load`], and
/// `Agent_OnUnload`, which calls [`Agent::on_unload`].
///
/// Only one agent instance exists per VM; a second `Agent_OnLoad` returns
/// `JNI_ERR`.
#[macro_export]
macro_rules! export_agent {
    ($agent_type:ty) => {
        #[no_mangle]
        pub unsafe extern "system" fn Agent_OnLoad(
            vm: *mut $crate::sys::jni::JavaVM,
            options: *mut std::ffi::c_char,
            _reserved: *mut std::ffi::c_void,
        ) -> $crate::sys::jni::jint {
            let agent = Box::new(<$agent_type>::default());
            if $crate::set_global_agent(agent).is_err() {
                return $crate::sys::jni::JNI_ERR;
            }

            let options_str = if options.is_null() {
                std::borrow::Cow::Borrowed("")
            } else {
                std::ffi::CStr::from_ptr(options).to_string_lossy()
            };

            match $crate::GLOBAL_AGENT.get() {
                Some(global_agent) => global_agent.on_load(vm, &options_str),
                None => $crate::sys::jni::JNI_ERR,
            }
        }

        #[no_mangle]
        pub unsafe extern "system" fn Agent_OnUnload(_vm: *mut $crate::sys::jni::JavaVM) {
            if let Some(agent) = $crate::GLOBAL_AGENT.get() {
                agent.on_unload();
            }
        }
    };
}

export_agent!(agent::SharedCachesAgent);
