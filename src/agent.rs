//! The shared classes cache test agent.

use crate::enumerate::{self, CacheEnumerator, PassReport};
use crate::error::AgentError;
use crate::host::JvmtiSharedCaches;
use crate::jvmti_wrapper::Jvmti;
use crate::logging::{self, LogEncoding};
use crate::options::{self, AgentOptions};
use crate::sys::{jni, jvmti};
use crate::{lifecycle_callbacks, Agent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::{error, info};

/// Parses its options at load time and walks the shared classes caches once
/// the VM has initialised.
#[derive(Default)]
pub struct SharedCachesAgent {
    options: OnceLock<AgentOptions>,
    enumerated: AtomicBool,
    outcome: OnceLock<Result<PassReport, AgentError>>,
}

impl SharedCachesAgent {
    pub fn options(&self) -> Option<&AgentOptions> {
        self.options.get()
    }

    /// Result of the enumeration pass, once it has run.
    pub fn outcome(&self) -> Option<&Result<PassReport, AgentError>> {
        self.outcome.get()
    }

    fn register_vm_init(&self, vm: *mut jni::JavaVM) -> Result<(), AgentError> {
        let jvmti_env = Jvmti::new(vm).map_err(AgentError::GetEnv)?;

        jvmti_env
            .set_event_callbacks(lifecycle_callbacks())
            .map_err(|error| AgentError::Jvmti { call: "SetEventCallbacks", error })?;

        jvmti_env
            .set_event_notification_mode(true, jvmti::JVMTI_EVENT_VM_INIT, std::ptr::null_mut())
            .map_err(|error| AgentError::Jvmti { call: "SetEventNotificationMode", error })?;
        Ok(())
    }

    /// Runs `pass` with the parsed options, at most once per agent.
    pub fn enumerate<F>(&self, pass: F) -> Result<PassReport, AgentError>
    where
        F: FnOnce(&AgentOptions) -> Result<PassReport, AgentError>,
    {
        if self.enumerated.swap(true, Ordering::SeqCst) {
            return Err(AgentError::AlreadyEnumerated);
        }

        let options = self.options.get_or_init(AgentOptions::default);
        let result = pass(options);
        match &result {
            Ok(_) => info!("Iterating over caches: SUCCESS"),
            Err(err) => {
                error!("{}", err);
                error!("Iterating over caches: ERROR");
            }
        }
        let _ = self.outcome.set(result.clone());
        result
    }
}

impl Agent for SharedCachesAgent {
    fn on_load(&self, vm: *mut jni::JavaVM, options: &str) -> jni::jint {
        let encoding = options::find_option(options, options::LOG_ENCODING)
            .and_then(LogEncoding::from_option)
            .unwrap_or_default();
        logging::init(encoding);

        let _ = self.options.set(AgentOptions::parse(options));

        match self.register_vm_init(vm) {
            Ok(()) => {
                info!("onload processing complete");
                jni::JNI_OK
            }
            Err(err) => {
                error!("{}", err);
                err.status()
            }
        }
    }

    fn vm_init(&self, jvmti: &Jvmti, _jni: *mut jni::JNIEnv, _thread: jni::jthread) {
        info!("Starting iterating over caches from VM Init event");
        let _ = self.enumerate(|options| {
            enumerate::log_query_directory(options);
            let host = JvmtiSharedCaches::resolve(jvmti)?;
            CacheEnumerator::new(&host, options).run()
        });
    }
}
