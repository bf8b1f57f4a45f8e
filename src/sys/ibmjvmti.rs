// sharedcache-agent/src/sys/ibmjvmti.rs
//
// OpenJ9 JVMTI extensions for shared classes caches (from ibmjvmti.h).
//
// Extension functions are looked up by id through GetExtensionFunctions.
// The table advertises them as variadic, but the VM implements them with the
// fixed signatures below, which is how they must be called.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::os::raw::{c_char, c_void};
use crate::sys::jni::{jboolean, jint, jlong};
use crate::sys::jvmti::{jvmtiEnv, jvmtiError};

pub const COM_IBM_ITERATE_SHARED_CACHES: &str = "com.ibm.IterateSharedCaches";
pub const COM_IBM_DESTROY_SHARED_CACHE: &str = "com.ibm.DestroySharedCache";

pub const COM_IBM_ITERATE_SHARED_CACHES_VERSION_1: jint = 1;

pub const COM_IBM_ITERATE_SHARED_CACHES_NO_FLAGS: jint = 0;

// Persistence argument of DestroySharedCache
pub const COM_IBM_SHARED_CACHE_PERSISTENT: jint = 1;
pub const COM_IBM_SHARED_CACHE_NONPERSISTENT: jint = 2;

// internal_rc values reported by DestroySharedCache
pub const COM_IBM_DESTROYED_ALL_CACHE: jint = 0;
pub const COM_IBM_DESTROYED_NONE: jint = -1;
pub const COM_IBM_DESTROY_FAILED_CURRENT_GEN_CACHE: jint = -2;
pub const COM_IBM_DESTROY_FAILED_OLDER_GEN_CACHE: jint = -3;

/// Per-cache information passed to the iteration callback.
///
/// Field order follows `ibmjvmti.h`. Later fields are only filled in for
/// newer iterate versions; this agent reads `name` and `isPersistent`, which
/// every version sets.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct jvmtiSharedCacheInfo {
    pub name: *const c_char,
    pub isCompatible: jboolean,
    pub isPersistent: jboolean,
    pub os_shmid: jint,
    pub os_semid: jint,
    pub modLevel: jint,
    pub addrMode: jint,
    pub isCorrupt: jboolean,
    pub cacheSize: jlong,
    pub freeBytes: jlong,
    pub lastDetach: jlong,
    pub cacheType: jint,
    pub softMaxBytes: jlong,
    pub layer: jint,
}

pub type jvmtiIterateSharedCachesCallback = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    cache_info: *mut jvmtiSharedCacheInfo,
    user_data: *mut c_void,
) -> jint;

pub type ComIbmIterateSharedCachesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    version: jint,
    cache_dir: *const c_char,
    flags: jint,
    use_command_line_values: jboolean,
    callback: Option<jvmtiIterateSharedCachesCallback>,
    user_data: *mut c_void,
) -> jvmtiError;

pub type ComIbmDestroySharedCacheFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    cache_dir: *const c_char,
    name: *const c_char,
    persistence: jint,
    use_command_line_values: jboolean,
    internal_rc: *mut jint,
) -> jvmtiError;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn cache_info_layout_matches_ibmjvmti_h() {
        assert_eq!(offset_of!(jvmtiSharedCacheInfo, name), 0);
        assert!(offset_of!(jvmtiSharedCacheInfo, isPersistent) > offset_of!(jvmtiSharedCacheInfo, isCompatible));
        assert!(offset_of!(jvmtiSharedCacheInfo, lastDetach) > offset_of!(jvmtiSharedCacheInfo, freeBytes));
        assert!(offset_of!(jvmtiSharedCacheInfo, cacheType) > offset_of!(jvmtiSharedCacheInfo, lastDetach));
        assert!(offset_of!(jvmtiSharedCacheInfo, modLevel) < offset_of!(jvmtiSharedCacheInfo, cacheSize));
    }
}
