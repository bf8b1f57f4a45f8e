// Loads the agent through its exported entry points against a fake VM.
//
// GLOBAL_AGENT is process-wide, so everything here runs as one test.

use sharedcache_agent::sys::ibmjvmti::{self, jvmtiIterateSharedCachesCallback, jvmtiSharedCacheInfo};
use sharedcache_agent::sys::jni::{self, JNIInvokeInterface_, JavaVM};
use sharedcache_agent::sys::jvmti::{
    self, jvmtiEnv, jvmtiError, jvmtiEventCallbacks, jvmtiExtensionFunctionInfo, jvmtiInterface_1_,
};
use sharedcache_agent::{Agent_OnLoad, Agent_OnUnload};
use std::ffi::{c_void, CStr, CString};
use std::os::raw::{c_char, c_uchar};
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Mutex;

static ENV: AtomicPtr<jvmtiEnv> = AtomicPtr::new(ptr::null_mut());
static VM_INIT: Mutex<Option<jvmti::JvmtiVMInitFn>> = Mutex::new(None);
static NOTIFICATIONS: Mutex<Vec<(jni::jint, u32)>> = Mutex::new(Vec::new());
static ITERATE_VERSIONS: Mutex<Vec<jni::jint>> = Mutex::new(Vec::new());
static DESTROYED: Mutex<Vec<String>> = Mutex::new(Vec::new());

const CACHES: [&[u8]; 3] = [b"wl_alpha\0", b"base\0", b"wl_beta\0"];

unsafe extern "system" fn stub_vm(_vm: *mut JavaVM) -> jni::jint {
    jni::JNI_ERR
}

unsafe extern "system" fn stub_attach(_vm: *mut JavaVM, _penv: *mut *mut c_void, _args: *mut c_void) -> jni::jint {
    jni::JNI_ERR
}

unsafe extern "system" fn fake_get_env(_vm: *mut JavaVM, penv: *mut *mut c_void, version: jni::jint) -> jni::jint {
    if version != jvmti::JVMTI_VERSION_1_0 {
        return jni::JNI_EVERSION;
    }
    *penv = ENV.load(Ordering::SeqCst) as *mut c_void;
    jni::JNI_OK
}

unsafe extern "system" fn fake_set_event_callbacks(
    _env: *mut jvmtiEnv,
    callbacks: *const jvmtiEventCallbacks,
    size_of_callbacks: jni::jint,
) -> jvmtiError {
    assert_eq!(size_of_callbacks as usize, std::mem::size_of::<jvmtiEventCallbacks>());
    *VM_INIT.lock().unwrap() = (*callbacks).VMInit;
    jvmtiError::NONE
}

unsafe extern "system" fn fake_set_event_notification_mode(
    _env: *mut jvmtiEnv,
    mode: jni::jint,
    event_type: u32,
    _thread: jni::jthread,
) -> jvmtiError {
    NOTIFICATIONS.lock().unwrap().push((mode, event_type));
    jvmtiError::NONE
}

unsafe extern "system" fn fake_deallocate(_env: *mut jvmtiEnv, _mem: *mut c_uchar) -> jvmtiError {
    jvmtiError::NONE
}

unsafe extern "system" fn fake_iterate(
    env: *mut jvmtiEnv,
    version: jni::jint,
    _cache_dir: *const c_char,
    flags: jni::jint,
    _use_command_line_values: jni::jboolean,
    callback: Option<jvmtiIterateSharedCachesCallback>,
    user_data: *mut c_void,
) -> jvmtiError {
    ITERATE_VERSIONS.lock().unwrap().push(version);
    if version != ibmjvmti::COM_IBM_ITERATE_SHARED_CACHES_VERSION_1 {
        return jvmtiError::UNSUPPORTED_VERSION;
    }
    if flags != ibmjvmti::COM_IBM_ITERATE_SHARED_CACHES_NO_FLAGS {
        return jvmtiError::ILLEGAL_ARGUMENT;
    }
    let Some(callback) = callback else {
        return jvmtiError::NULL_POINTER;
    };
    for name in CACHES {
        let mut info: jvmtiSharedCacheInfo = std::mem::zeroed();
        info.name = name.as_ptr() as *const c_char;
        info.isPersistent = jni::JNI_TRUE;
        callback(env, &mut info, user_data);
    }
    jvmtiError::NONE
}

unsafe extern "system" fn fake_destroy(
    _env: *mut jvmtiEnv,
    _cache_dir: *const c_char,
    name: *const c_char,
    _persistence: jni::jint,
    _use_command_line_values: jni::jboolean,
    internal_rc: *mut jni::jint,
) -> jvmtiError {
    DESTROYED.lock().unwrap().push(CStr::from_ptr(name).to_string_lossy().into_owned());
    *internal_rc = ibmjvmti::COM_IBM_DESTROYED_ALL_CACHE;
    jvmtiError::NONE
}

unsafe extern "system" fn fake_get_extension_functions(
    _env: *mut jvmtiEnv,
    count_ptr: *mut jni::jint,
    ext_ptr: *mut *mut jvmtiExtensionFunctionInfo,
) -> jvmtiError {
    let entry = |id: &str, func: *mut c_void| jvmtiExtensionFunctionInfo {
        func,
        id: CString::new(id).unwrap().into_raw(),
        short_description: ptr::null_mut(),
        param_count: 0,
        params: ptr::null_mut(),
        error_count: 0,
        errors: ptr::null_mut(),
    };
    let extensions = vec![
        entry(
            ibmjvmti::COM_IBM_ITERATE_SHARED_CACHES,
            fake_iterate as ibmjvmti::ComIbmIterateSharedCachesFn as *mut c_void,
        ),
        entry(
            ibmjvmti::COM_IBM_DESTROY_SHARED_CACHE,
            fake_destroy as ibmjvmti::ComIbmDestroySharedCacheFn as *mut c_void,
        ),
    ];
    *count_ptr = extensions.len() as jni::jint;
    *ext_ptr = Box::into_raw(extensions.into_boxed_slice()) as *mut jvmtiExtensionFunctionInfo;
    jvmtiError::NONE
}

fn install_fake_env() -> *mut jvmtiEnv {
    let mut table: Box<jvmtiInterface_1_> = Box::new(unsafe { std::mem::zeroed() });
    table.SetEventCallbacks = Some(fake_set_event_callbacks);
    table.SetEventNotificationMode = Some(fake_set_event_notification_mode);
    table.GetExtensionFunctions = Some(fake_get_extension_functions);
    table.Deallocate = Some(fake_deallocate);

    let env = Box::into_raw(Box::new(jvmtiEnv { functions: Box::leak(table) }));
    ENV.store(env, Ordering::SeqCst);
    env
}

#[test]
fn load_then_vm_init_runs_one_pass() {
    let env = install_fake_env();
    let invoke = JNIInvokeInterface_ {
        reserved0: ptr::null_mut(),
        reserved1: ptr::null_mut(),
        reserved2: ptr::null_mut(),
        DestroyJavaVM: stub_vm,
        AttachCurrentThread: stub_attach,
        DetachCurrentThread: stub_vm,
        GetEnv: fake_get_env,
        AttachCurrentThreadAsDaemon: stub_attach,
    };
    let mut vm: JavaVM = &invoke;
    let options = CString::new("cacheDir=/tmp/lifecycle,deleteCaches=true,cachePrefix=wl_,expectedCacheCount=3").unwrap();

    let rc = unsafe { Agent_OnLoad(&mut vm, options.as_ptr() as *mut c_char, ptr::null_mut()) };
    assert_eq!(rc, jni::JNI_OK);
    assert_eq!(*NOTIFICATIONS.lock().unwrap(), vec![(jvmti::JVMTI_ENABLE, jvmti::JVMTI_EVENT_VM_INIT)]);
    // Nothing is touched until the VM is initialised.
    assert!(ITERATE_VERSIONS.lock().unwrap().is_empty());

    let vm_init = VM_INIT.lock().unwrap().expect("VMInit callback installed");
    unsafe { vm_init(env, ptr::null_mut(), ptr::null_mut()) };

    assert_eq!(*ITERATE_VERSIONS.lock().unwrap(), vec![1000, 1, 1]);
    assert_eq!(*DESTROYED.lock().unwrap(), vec!["wl_alpha", "wl_beta"]);

    // A repeated VMInit does not start a second pass.
    unsafe { vm_init(env, ptr::null_mut(), ptr::null_mut()) };
    assert_eq!(ITERATE_VERSIONS.lock().unwrap().len(), 3);
    assert_eq!(DESTROYED.lock().unwrap().len(), 2);

    // A null environment is ignored.
    unsafe { vm_init(ptr::null_mut(), ptr::null_mut(), ptr::null_mut()) };

    let rc = unsafe { Agent_OnLoad(&mut vm, options.as_ptr() as *mut c_char, ptr::null_mut()) };
    assert_eq!(rc, jni::JNI_ERR);

    unsafe { Agent_OnUnload(&mut vm) };
}
