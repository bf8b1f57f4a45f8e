// sharedcache-agent/src/jvmti_wrapper.rs
use crate::sys::jni;
use crate::sys::jvmti;
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::ptr;

/// A safe wrapper around the raw JVMTI Environment pointer.
pub struct Jvmti {
    env: *mut jvmti::jvmtiEnv,
}

/// One entry of the VM's extension function table, copied out of
/// JVMTI-owned memory.
#[derive(Debug, Clone)]
pub struct ExtensionFunction {
    pub id: String,
    pub short_description: String,
    /// Entry point. Must be cast to the extension's real signature before use.
    pub func: *mut c_void,
}

impl Jvmti {
    /// Connects to the JVM and retrieves a JVMTI 1.0 environment.
    pub fn new(vm: *mut jni::JavaVM) -> Result<Self, jni::jint> {
        if vm.is_null() {
            return Err(jni::JNI_ERR);
        }

        let mut env_ptr: *mut c_void = ptr::null_mut();
        unsafe {
            // vm: *mut JavaVM = *mut *const JNIInvokeInterface_
            let get_env_fn = (**vm).GetEnv;
            let res = get_env_fn(vm, &mut env_ptr, jvmti::JVMTI_VERSION_1_0);
            if res != jni::JNI_OK {
                return Err(res);
            }
        }

        if env_ptr.is_null() {
            return Err(jni::JNI_ERR);
        }
        Ok(Jvmti {
            env: env_ptr as *mut jvmti::jvmtiEnv,
        })
    }

    /// Create a Jvmti wrapper from a raw jvmtiEnv pointer
    ///
    /// # Safety
    /// The caller must ensure the pointer is valid for the duration of use.
    pub unsafe fn from_raw(env: *mut jvmti::jvmtiEnv) -> Self {
        Jvmti { env }
    }

    /// Get the raw jvmtiEnv pointer
    pub fn raw(&self) -> *mut jvmti::jvmtiEnv {
        self.env
    }

    fn functions(&self) -> &jvmti::jvmtiInterface_1_ {
        unsafe { &*(*self.env).functions }
    }

    pub fn set_event_callbacks(&self, callbacks: jvmti::jvmtiEventCallbacks) -> Result<(), jvmti::jvmtiError> {
        let set_callbacks_fn = self.functions().SetEventCallbacks.ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
        let size = std::mem::size_of::<jvmti::jvmtiEventCallbacks>() as jni::jint;

        let err = unsafe { set_callbacks_fn(self.env, &callbacks, size) };
        if err != jvmti::jvmtiError::NONE {
            return Err(err);
        }
        Ok(())
    }

    pub fn set_event_notification_mode(&self, enable: bool, event_type: u32, thread: jni::jthread) -> Result<(), jvmti::jvmtiError> {
        let set_mode_fn = self.functions().SetEventNotificationMode.ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
        let mode = if enable { jvmti::JVMTI_ENABLE } else { jvmti::JVMTI_DISABLE };

        // thread can be null (all threads)
        let err = unsafe { set_mode_fn(self.env, mode, event_type, thread) };
        if err != jvmti::jvmtiError::NONE {
            return Err(err);
        }
        Ok(())
    }

    pub fn deallocate(&self, mem: *mut u8) -> Result<(), jvmti::jvmtiError> {
        if mem.is_null() {
            return Ok(());
        }
        let deallocate_fn = self.functions().Deallocate.ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
        let err = unsafe { deallocate_fn(self.env, mem) };
        if err != jvmti::jvmtiError::NONE {
            return Err(err);
        }
        Ok(())
    }

    /// Lists the VM's extension functions.
    ///
    /// Every block the VM allocated for the table (ids, descriptions,
    /// parameter and error arrays, and the table itself) is released before
    /// returning, so only the copied ids and raw entry points survive.
    pub fn get_extension_functions(&self) -> Result<Vec<ExtensionFunction>, jvmti::jvmtiError> {
        let get_fn = self.functions().GetExtensionFunctions.ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
        let mut count: jni::jint = 0;
        let mut ext_ptr: *mut jvmti::jvmtiExtensionFunctionInfo = ptr::null_mut();

        let err = unsafe { get_fn(self.env, &mut count, &mut ext_ptr) };
        if err != jvmti::jvmtiError::NONE {
            return Err(err);
        }
        if ext_ptr.is_null() || count <= 0 {
            self.deallocate(ext_ptr as *mut u8)?;
            return Ok(Vec::new());
        }

        let infos = unsafe { std::slice::from_raw_parts(ext_ptr, count as usize) };
        let functions = infos
            .iter()
            .map(|info| ExtensionFunction {
                id: unsafe { owned_string(info.id) },
                short_description: unsafe { owned_string(info.short_description) },
                func: info.func,
            })
            .collect();

        for info in infos {
            self.deallocate(info.id as *mut u8)?;
            self.deallocate(info.short_description as *mut u8)?;
            if !info.params.is_null() && info.param_count > 0 {
                let params = unsafe { std::slice::from_raw_parts(info.params, info.param_count as usize) };
                for param in params {
                    self.deallocate(param.name as *mut u8)?;
                }
            }
            self.deallocate(info.params as *mut u8)?;
            self.deallocate(info.errors as *mut u8)?;
        }
        self.deallocate(ext_ptr as *mut u8)?;

        Ok(functions)
    }
}

unsafe fn owned_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}
