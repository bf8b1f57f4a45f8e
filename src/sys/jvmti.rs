// sharedcache-agent/src/sys/jvmti.rs
//
// JVMTI (JVM Tool Interface) bindings for the functions this agent calls.
//
// The interface table keeps the exact jvmti.h layout (156 slots). Slots the
// agent never calls are kept as untyped padding so the named entries land
// at the right offsets:
//   -   2: SetEventNotificationMode
//   -  47: Deallocate
//   - 122: SetEventCallbacks
//   - 124: GetExtensionFunctions

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::fmt;
use std::os::raw::{c_char, c_uchar, c_void};
use crate::sys::jni::{jboolean, jint, jthread, JNIEnv};

// --- Constants ---
pub const JVMTI_VERSION_1_0: jint = 0x30010000;

pub const JVMTI_EVENT_VM_INIT: u32 = 50;

pub const JVMTI_ENABLE: jint = 1;
pub const JVMTI_DISABLE: jint = 0;

// --- Error Codes ---

/// A raw `jvmtiError` code.
///
/// Kept as a transparent integer rather than a Rust enum: vendor extension
/// functions may return codes outside the standard set, and those must still
/// be representable when they cross the FFI boundary.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct jvmtiError(pub u32);

impl jvmtiError {
    pub const NONE: Self = Self(0);
    pub const INVALID_THREAD: Self = Self(10);
    pub const INVALID_CLASS: Self = Self(21);
    pub const UNSUPPORTED_VERSION: Self = Self(68);
    pub const NOT_AVAILABLE: Self = Self(98);
    pub const MUST_POSSESS_CAPABILITY: Self = Self(99);
    pub const NULL_POINTER: Self = Self(100);
    pub const ABSENT_INFORMATION: Self = Self(101);
    pub const INVALID_EVENT_TYPE: Self = Self(102);
    pub const ILLEGAL_ARGUMENT: Self = Self(103);
    pub const OUT_OF_MEMORY: Self = Self(110);
    pub const WRONG_PHASE: Self = Self(112);
    pub const INTERNAL: Self = Self(113);
    pub const INVALID_ENVIRONMENT: Self = Self(116);

    /// Symbolic name for the standard codes this crate knows about.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::NONE => "JVMTI_ERROR_NONE",
            Self::INVALID_THREAD => "JVMTI_ERROR_INVALID_THREAD",
            Self::INVALID_CLASS => "JVMTI_ERROR_INVALID_CLASS",
            Self::UNSUPPORTED_VERSION => "JVMTI_ERROR_UNSUPPORTED_VERSION",
            Self::NOT_AVAILABLE => "JVMTI_ERROR_NOT_AVAILABLE",
            Self::MUST_POSSESS_CAPABILITY => "JVMTI_ERROR_MUST_POSSESS_CAPABILITY",
            Self::NULL_POINTER => "JVMTI_ERROR_NULL_POINTER",
            Self::ABSENT_INFORMATION => "JVMTI_ERROR_ABSENT_INFORMATION",
            Self::INVALID_EVENT_TYPE => "JVMTI_ERROR_INVALID_EVENT_TYPE",
            Self::ILLEGAL_ARGUMENT => "JVMTI_ERROR_ILLEGAL_ARGUMENT",
            Self::OUT_OF_MEMORY => "JVMTI_ERROR_OUT_OF_MEMORY",
            Self::WRONG_PHASE => "JVMTI_ERROR_WRONG_PHASE",
            Self::INTERNAL => "JVMTI_ERROR_INTERNAL",
            Self::INVALID_ENVIRONMENT => "JVMTI_ERROR_INVALID_ENVIRONMENT",
            _ => return None,
        })
    }
}

impl fmt::Debug for jvmtiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}({})", name, self.0),
            None => write!(f, "jvmtiError({})", self.0),
        }
    }
}

impl fmt::Display for jvmtiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// --- Extension functions ---

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct jvmtiExtensionFunctionInfo {
    pub func: *mut c_void,
    pub id: *mut c_char,
    pub short_description: *mut c_char,
    pub param_count: jint,
    pub params: *mut jvmtiExtensionParamInfo,
    pub error_count: jint,
    pub errors: *mut jvmtiError,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct jvmtiExtensionParamInfo {
    pub name: *mut c_char,
    pub kind: jint,
    pub base_type: jint,
    pub null_ok: jboolean,
}

// --- Function table entries ---

pub type JvmtiSetEventNotificationModeFn = unsafe extern "system" fn(env: *mut jvmtiEnv, mode: jint, event_type: u32, event_thread: jthread) -> jvmtiError;
pub type JvmtiDeallocateFn = unsafe extern "system" fn(env: *mut jvmtiEnv, mem: *mut c_uchar) -> jvmtiError;
pub type JvmtiSetEventCallbacksFn = unsafe extern "system" fn(env: *mut jvmtiEnv, callbacks: *const jvmtiEventCallbacks, size_of_callbacks: jint) -> jvmtiError;
pub type JvmtiGetExtensionFunctionsFn = unsafe extern "system" fn(env: *mut jvmtiEnv, extension_count_ptr: *mut jint, extensions_ptr: *mut *mut jvmtiExtensionFunctionInfo) -> jvmtiError;

#[repr(C)]
pub struct jvmtiInterface_1_ {
    /*   1:  RESERVED */
    pub reserved1: *mut c_void,
    /*   2: Set Event Notification Mode */
    pub SetEventNotificationMode: Option<JvmtiSetEventNotificationModeFn>,
    /*   3 - 46 */
    pub unused3_46: [*mut c_void; 44],
    /*  47: Deallocate */
    pub Deallocate: Option<JvmtiDeallocateFn>,
    /*  48 - 121 */
    pub unused48_121: [*mut c_void; 74],
    /* 122: Set Event Callbacks */
    pub SetEventCallbacks: Option<JvmtiSetEventCallbacksFn>,
    /* 123: Generate Events */
    pub unused123: *mut c_void,
    /* 124: Get Extension Functions */
    pub GetExtensionFunctions: Option<JvmtiGetExtensionFunctionsFn>,
    /* 125 - 156 */
    pub unused125_156: [*mut c_void; 32],
}

#[repr(C)]
pub struct jvmtiEnv {
    pub functions: *const jvmtiInterface_1_,
}

// --- Event callbacks ---

pub type JvmtiVMInitFn = unsafe extern "system" fn(
    jvmti_env: *mut jvmtiEnv,
    jni_env: *mut JNIEnv,
    thread: jthread,
);

/// Leading part of `jvmtiEventCallbacks`.
///
/// `SetEventCallbacks` takes the structure size, so the VM treats every slot
/// past the end of this struct as unset.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug)]
pub struct jvmtiEventCallbacks {
    pub VMInit: Option<JvmtiVMInitFn>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn interface_table_slots_match_jvmti_h() {
        let slot = size_of::<*mut c_void>();
        assert_eq!(offset_of!(jvmtiInterface_1_, SetEventNotificationMode), slot);
        assert_eq!(offset_of!(jvmtiInterface_1_, Deallocate), 46 * slot);
        assert_eq!(offset_of!(jvmtiInterface_1_, SetEventCallbacks), 121 * slot);
        assert_eq!(offset_of!(jvmtiInterface_1_, GetExtensionFunctions), 123 * slot);
        assert_eq!(size_of::<jvmtiInterface_1_>(), 156 * slot);
    }

    #[test]
    fn unknown_error_codes_format_numerically() {
        assert_eq!(format!("{:?}", jvmtiError::ILLEGAL_ARGUMENT), "JVMTI_ERROR_ILLEGAL_ARGUMENT(103)");
        assert_eq!(format!("{}", jvmtiError(9001)), "jvmtiError(9001)");
        assert_eq!(jvmtiError(9001).name(), None);
    }
}
