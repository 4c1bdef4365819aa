//! FFI bindings for Screen Impact
//!
//! C-compatible entry points for the mobile hosts. All functions take
//! null-terminated UTF-8 strings and return allocated memory that must be
//! freed by the caller using `impact_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::ImpactError;
use crate::pipeline::{default_engine, simulation_to_impact_json, ImpactEngine};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Borrow a C string as UTF-8; `None` for NULL or invalid UTF-8
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Optional C string argument: NULL means "use the default"
unsafe fn optional_cstr<'a>(ptr: *const c_char, what: &str) -> Result<Option<&'a str>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    cstr_to_str(ptr)
        .map(Some)
        .ok_or_else(|| format!("Invalid {what} string (not UTF-8)"))
}

/// Hand a Rust string to the caller (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => {
            set_last_error("Output contained an interior NUL byte");
            ptr::null_mut()
        }
    }
}

fn finish(result: Result<String, ImpactError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Calculate the impact result for a submission with the built-in catalog.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `impact_free_string`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_calculate(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_str(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    finish(simulation_to_impact_json(json_str.to_string()))
}

/// Calculate and wrap the result in a report envelope.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `impact_free_string`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_report(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = cstr_to_str(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    finish(default_engine().report_json(json_str))
}

// ============================================================================
// Configured Engine API
// ============================================================================

/// Opaque handle to an ImpactEngine
pub struct ImpactEngineHandle {
    engine: ImpactEngine,
}

/// Create an engine from optional configuration and reference JSON.
///
/// # Safety
/// - `config_json` and `reference_json` must each be NULL (use defaults) or
///   a valid null-terminated C string.
/// - Returns a pointer that must be freed with `impact_engine_free`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_engine_new(
    config_json: *const c_char,
    reference_json: *const c_char,
) -> *mut ImpactEngineHandle {
    clear_last_error();

    let config = match optional_cstr(config_json, "config") {
        Ok(c) => c,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };
    let reference = match optional_cstr(reference_json, "reference") {
        Ok(r) => r,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    match ImpactEngine::from_json(config, reference) {
        Ok(engine) => Box::into_raw(Box::new(ImpactEngineHandle { engine })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a pointer returned by `impact_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn impact_engine_free(engine: *mut ImpactEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Calculate a submission with a configured engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `impact_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `impact_free_string`.
/// - Returns NULL on error; call `impact_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn impact_engine_calculate(
    engine: *const ImpactEngineHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let Some(json_str) = cstr_to_str(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    finish(handle.engine.calculate_json(json_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by an `impact_*` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by an `impact_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn impact_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `impact_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn impact_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn impact_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
