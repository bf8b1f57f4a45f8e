//! The VM side of the shared cache extension API.
//!
//! [`SharedCacheHost`] is the seam between the enumeration logic and the VM:
//! [`JvmtiSharedCaches`] implements it on top of the OpenJ9 extension
//! functions, and tests substitute their own implementation.

use crate::error::AgentError;
use crate::jvmti_wrapper::Jvmti;
use crate::sys::ibmjvmti;
use crate::sys::jni;
use crate::sys::jvmti::{self, jvmtiError};
use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::ptr;
use tracing::debug;

/// One cache reported by the VM during iteration.
///
/// Borrowed from the VM and only valid for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct CacheRecord<'a> {
    pub name: &'a CStr,
    pub persistent: bool,
}

impl CacheRecord<'_> {
    pub fn cache_type(&self) -> CacheType {
        if self.persistent {
            CacheType::Persistent
        } else {
            CacheType::NonPersistent
        }
    }
}

/// Persistence code passed to the destroy extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum CacheType {
    Persistent = ibmjvmti::COM_IBM_SHARED_CACHE_PERSISTENT,
    NonPersistent = ibmjvmti::COM_IBM_SHARED_CACHE_NONPERSISTENT,
    /// Accepted by the destroy extension but never produced by iteration.
    Invalid = 3,
}

impl CacheType {
    pub fn code(self) -> jni::jint {
        self as jni::jint
    }
}

/// A destroy request the VM refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyFailure {
    pub error: jvmtiError,
    /// The VM's own return code for the attempt.
    pub internal_rc: jni::jint,
}

impl fmt::Display for DestroyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meaning = match self.internal_rc {
            ibmjvmti::COM_IBM_DESTROYED_ALL_CACHE => "destroyed all caches",
            ibmjvmti::COM_IBM_DESTROYED_NONE => "no caches destroyed",
            ibmjvmti::COM_IBM_DESTROY_FAILED_CURRENT_GEN_CACHE => "failed to destroy current generation cache",
            ibmjvmti::COM_IBM_DESTROY_FAILED_OLDER_GEN_CACHE => "failed to destroy older generation cache",
            _ => "unknown",
        };
        write!(f, "{} (return code was {}: {})", self.error, self.internal_rc, meaning)
    }
}

/// Visitor invoked once per cache during iteration.
pub type CacheVisitor<'v> = dyn FnMut(&CacheRecord<'_>) + 'v;

/// Iterate and destroy operations offered by the VM.
pub trait SharedCacheHost {
    /// Walks every cache in `cache_dir` (the VM default when `None`),
    /// calling `visitor` once per cache.
    fn iterate(
        &self,
        version: jni::jint,
        cache_dir: Option<&str>,
        flags: jni::jint,
        use_command_line_values: bool,
        visitor: &mut CacheVisitor<'_>,
    ) -> Result<(), jvmtiError>;

    /// Asks the VM to destroy the named cache.
    fn destroy(
        &self,
        cache_dir: Option<&str>,
        name: &CStr,
        cache_type: CacheType,
        use_command_line_values: bool,
    ) -> Result<(), DestroyFailure>;
}

/// [`SharedCacheHost`] backed by the OpenJ9 JVMTI extension functions.
pub struct JvmtiSharedCaches<'j> {
    jvmti: &'j Jvmti,
    iterate_fn: ibmjvmti::ComIbmIterateSharedCachesFn,
    destroy_fn: ibmjvmti::ComIbmDestroySharedCacheFn,
}

impl<'j> JvmtiSharedCaches<'j> {
    /// Looks up the iterate and destroy extensions by id.
    pub fn resolve(jvmti: &'j Jvmti) -> Result<Self, AgentError> {
        let functions = jvmti
            .get_extension_functions()
            .map_err(|error| AgentError::Jvmti { call: "GetExtensionFunctions", error })?;

        let mut iterate = ptr::null_mut();
        let mut destroy = ptr::null_mut();
        for function in &functions {
            debug!("extension function {}: {}", function.id, function.short_description);
            if function.id == ibmjvmti::COM_IBM_ITERATE_SHARED_CACHES {
                iterate = function.func;
            } else if function.id == ibmjvmti::COM_IBM_DESTROY_SHARED_CACHE {
                destroy = function.func;
            }
        }

        if iterate.is_null() {
            return Err(AgentError::MissingExtension(ibmjvmti::COM_IBM_ITERATE_SHARED_CACHES));
        }
        if destroy.is_null() {
            return Err(AgentError::MissingExtension(ibmjvmti::COM_IBM_DESTROY_SHARED_CACHE));
        }

        // The VM implements both extensions with these fixed signatures.
        let (iterate_fn, destroy_fn) = unsafe {
            (
                std::mem::transmute::<*mut c_void, ibmjvmti::ComIbmIterateSharedCachesFn>(iterate),
                std::mem::transmute::<*mut c_void, ibmjvmti::ComIbmDestroySharedCacheFn>(destroy),
            )
        };

        Ok(JvmtiSharedCaches { jvmti, iterate_fn, destroy_fn })
    }
}

fn c_dir(cache_dir: Option<&str>) -> Result<Option<CString>, jvmtiError> {
    cache_dir
        .map(CString::new)
        .transpose()
        .map_err(|_| jvmtiError::ILLEGAL_ARGUMENT)
}

fn as_ptr(dir: &Option<CString>) -> *const std::os::raw::c_char {
    dir.as_ref().map_or(ptr::null(), |d| d.as_ptr())
}

fn to_jboolean(value: bool) -> jni::jboolean {
    if value {
        jni::JNI_TRUE
    } else {
        jni::JNI_FALSE
    }
}

unsafe extern "system" fn visit_cache(
    _env: *mut jvmti::jvmtiEnv,
    cache_info: *mut ibmjvmti::jvmtiSharedCacheInfo,
    user_data: *mut c_void,
) -> jni::jint {
    if cache_info.is_null() || user_data.is_null() || (*cache_info).name.is_null() {
        return jni::JNI_OK;
    }
    let visitor = &mut *(user_data as *mut &mut CacheVisitor<'_>);
    let record = CacheRecord {
        name: CStr::from_ptr((*cache_info).name),
        persistent: (*cache_info).isPersistent != jni::JNI_FALSE,
    };
    visitor(&record);
    jni::JNI_OK
}

impl SharedCacheHost for JvmtiSharedCaches<'_> {
    fn iterate(
        &self,
        version: jni::jint,
        cache_dir: Option<&str>,
        flags: jni::jint,
        use_command_line_values: bool,
        visitor: &mut CacheVisitor<'_>,
    ) -> Result<(), jvmtiError> {
        let dir = c_dir(cache_dir)?;
        let mut visitor = visitor;
        let user_data = &mut visitor as *mut &mut CacheVisitor<'_> as *mut c_void;

        let err = unsafe {
            (self.iterate_fn)(
                self.jvmti.raw(),
                version,
                as_ptr(&dir),
                flags,
                to_jboolean(use_command_line_values),
                Some(visit_cache),
                user_data,
            )
        };
        if err != jvmtiError::NONE {
            return Err(err);
        }
        Ok(())
    }

    fn destroy(
        &self,
        cache_dir: Option<&str>,
        name: &CStr,
        cache_type: CacheType,
        use_command_line_values: bool,
    ) -> Result<(), DestroyFailure> {
        let dir = c_dir(cache_dir).map_err(|error| DestroyFailure { error, internal_rc: 0 })?;
        let mut internal_rc: jni::jint = 0;

        let err = unsafe {
            (self.destroy_fn)(
                self.jvmti.raw(),
                as_ptr(&dir),
                name.as_ptr(),
                cache_type.code(),
                to_jboolean(use_command_line_values),
                &mut internal_rc,
            )
        };
        if err != jvmtiError::NONE {
            return Err(DestroyFailure { error: err, internal_rc });
        }
        Ok(())
    }
}
