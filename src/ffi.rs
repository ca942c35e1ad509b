//! C FFI layer for the file manager extension.
//!
//! The host (a thin C or Python shim registered with Nautilus) creates one
//! [`TmsuExtension`] per provider object and talks to it through the
//! functions below. Structured data crosses the boundary as JSON strings that
//! must be released with `nautilus_tmsu_string_free()`.
//!
//! Callbacks are marshalled back through a `post` function supplied by the
//! host, normally a wrapper around `g_idle_add`.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::config::Config;
use crate::dispatch::{Dispatcher, UiJob};
use crate::error::TmsuResult;
use crate::executor::SystemRunner;
use crate::extension::Extension;
use crate::file::FileRef;
use crate::logging;
use crate::providers::{ColumnProvider, MenuProvider, OperationResult, PropertiesProvider, TagActions};
use crate::queue::TaskQueue;
use crate::tmsu::Tmsu;

/// Job handed to the host's `post` function
pub type JobFn = unsafe extern "C" fn(data: *mut c_void);

/// Schedules `job(data)` on the UI thread
pub type PostFn = unsafe extern "C" fn(job: JobFn, data: *mut c_void);

/// Receives the tags of a file. `value` is null when the file has no tags or
/// the lookup failed, and is only valid for the duration of the call.
pub type TagsCallback = unsafe extern "C" fn(handle: u64, value: *const c_char, user_data: *mut c_void);

/// Receives the outcome of a tag change: `true` when every command succeeded
pub type DoneCallback = unsafe extern "C" fn(success: bool, user_data: *mut c_void);

/// Receives a JSON array of tag names, valid for the duration of the call
pub type TagListCallback = unsafe extern "C" fn(tags_json: *const c_char, user_data: *mut c_void);

pub const RESULT_COMPLETE: c_int = 0;
pub const RESULT_IN_PROGRESS: c_int = 1;
pub const RESULT_FAILED: c_int = 2;

/// One queue per process, shared by every extension instance
static QUEUE: OnceCell<Arc<TaskQueue>> = OnceCell::new();

/// Opaque handle to an initialized extension.
///
/// Created by `nautilus_tmsu_extension_new()` and released with
/// `nautilus_tmsu_extension_free()`.
pub struct TmsuExtension {
    extension: Arc<Extension>,
    column: ColumnProvider,
    menu: MenuProvider,
    properties: PropertiesProvider,
    actions: TagActions,
}

impl TmsuExtension {
    fn new(extension: Arc<Extension>) -> Self {
        Self {
            column: ColumnProvider::new(Arc::clone(&extension)),
            menu: MenuProvider::new(Arc::clone(&extension)),
            properties: PropertiesProvider::new(Arc::clone(&extension)),
            actions: TagActions::new(Arc::clone(&extension)),
            extension,
        }
    }
}

/// Dispatcher backed by the host's `post` function
struct ForeignDispatcher {
    post: PostFn,
}

unsafe extern "C" fn run_job(data: *mut c_void) {
    if data.is_null() {
        return;
    }
    let job = Box::from_raw(data as *mut UiJob);
    job();
}

impl Dispatcher for ForeignDispatcher {
    fn dispatch(&self, job: UiJob) {
        let data = Box::into_raw(Box::new(job)) as *mut c_void;
        unsafe { (self.post)(run_job, data) }
    }
}

/// Host pointer carried to the UI thread untouched
struct UserData(*mut c_void);

// The pointer is only handed back to the host, on the thread it posts to.
unsafe impl Send for UserData {}

impl UserData {
    fn get(&self) -> *mut c_void {
        self.0
    }
}

#[cfg(feature = "glib-loop")]
fn default_dispatcher() -> Option<Arc<dyn Dispatcher>> {
    Some(Arc::new(crate::dispatch::GlibDispatcher))
}

#[cfg(not(feature = "glib-loop"))]
fn default_dispatcher() -> Option<Arc<dyn Dispatcher>> {
    None
}

fn shared_queue(dispatcher: Arc<dyn Dispatcher>) -> TmsuResult<Arc<TaskQueue>> {
    QUEUE
        .get_or_try_init(|| TaskQueue::spawn(Arc::new(SystemRunner), dispatcher))
        .map(Arc::clone)
}

/// Locate tmsu, and only then obtain the queue from `queue`
fn build_extension<Q>(config: Config, queue: Q) -> TmsuResult<Extension>
where
    Q: FnOnce() -> TmsuResult<Arc<TaskQueue>>,
{
    let tmsu = Tmsu::locate(&config.tmsu)?;
    Ok(Extension::with_tmsu(config, tmsu, queue()?))
}

/// Post a JSON array of tags to `callback`
fn send_tag_list(callback: TagListCallback, tags: &[String], user_data: &UserData) {
    let json = serde_json::to_string(tags)
        .ok()
        .and_then(|json| CString::new(json).ok())
        .unwrap_or_default();
    unsafe { callback(json.as_ptr(), user_data.get()) }
}

fn to_json_ptr<T: Serialize>(value: &T) -> *mut c_char {
    let json = match serde_json::to_string(value) {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };
    match CString::new(json) {
        Ok(s) => s.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

unsafe fn files_arg(ptr: *const c_char) -> Option<Vec<FileRef>> {
    serde_json::from_str(str_arg(ptr)?).ok()
}

unsafe fn tags_arg(ptr: *const c_char) -> Option<Vec<String>> {
    serde_json::from_str(str_arg(ptr)?).ok()
}

// ============================================================================
// FFI Functions
// ============================================================================

/// Create an extension instance.
///
/// `post` schedules callbacks on the UI thread. It may be null when the
/// library was built with the `glib-loop` feature, in which case the default
/// GLib main context is used.
///
/// Returns null when tmsu cannot be found; the host must not register its
/// providers in that case. Free with `nautilus_tmsu_extension_free()`.
#[no_mangle]
pub extern "C" fn nautilus_tmsu_extension_new(post: Option<PostFn>) -> *mut TmsuExtension {
    logging::init();
    let config = Config::load();

    let dispatcher: Arc<dyn Dispatcher> = match post {
        Some(post) => Arc::new(ForeignDispatcher { post }),
        None => match default_dispatcher() {
            Some(dispatcher) => dispatcher,
            None => {
                tracing::error!("no post function given and no main loop support built in");
                return ptr::null_mut();
            }
        },
    };

    match build_extension(config, || shared_queue(dispatcher)) {
        Ok(extension) => Box::into_raw(Box::new(TmsuExtension::new(Arc::new(extension)))),
        Err(e) => {
            tracing::error!("nautilus-tmsu disabled: {}", e);
            ptr::null_mut()
        }
    }
}

/// Free an extension instance.
///
/// # Safety
/// The handle must be a valid pointer returned by `nautilus_tmsu_extension_new()`.
/// After calling this function, the handle is no longer valid.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_extension_free(handle: *mut TmsuExtension) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Column descriptors as a JSON array.
///
/// # Safety
/// The handle must be valid. The result must be freed with
/// `nautilus_tmsu_string_free()`.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_columns_json(handle: *const TmsuExtension) -> *mut c_char {
    if handle.is_null() {
        return ptr::null_mut();
    }
    to_json_ptr(&(*handle).column.columns())
}

/// Start loading the tags of `path` for the column.
///
/// Returns `RESULT_COMPLETE` when there is nothing to load,
/// `RESULT_IN_PROGRESS` when `callback` will be invoked later on the UI
/// thread, or `RESULT_FAILED` on invalid arguments.
///
/// # Safety
/// The handle must be valid and `path` a valid UTF-8 C string. `user_data`
/// is passed back to `callback` unchanged and must stay valid until the
/// callback ran or `nautilus_tmsu_cancel()` was called for `request`.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_request_tags(
    handle: *const TmsuExtension,
    request: u64,
    path: *const c_char,
    is_dir: bool,
    callback: Option<TagsCallback>,
    user_data: *mut c_void,
) -> c_int {
    if handle.is_null() {
        return RESULT_FAILED;
    }
    let (Some(path), Some(callback)) = (str_arg(path), callback) else {
        return RESULT_FAILED;
    };

    let file = FileRef {
        path: path.into(),
        is_dir,
    };
    let user_data = UserData(user_data);
    let result = (*handle).column.update_file_info(request, file, move |update| {
        let value = update.value.and_then(|v| CString::new(v).ok());
        let value_ptr = value.as_ref().map_or(ptr::null(), |v| v.as_ptr());
        callback(update.handle, value_ptr, user_data.get());
    });

    match result {
        OperationResult::Complete => RESULT_COMPLETE,
        OperationResult::InProgress => RESULT_IN_PROGRESS,
        OperationResult::Failed => RESULT_FAILED,
    }
}

/// Cancel a pending `nautilus_tmsu_request_tags()`. Its callback will not run.
///
/// # Safety
/// The handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_cancel(handle: *const TmsuExtension, request: u64) {
    if !handle.is_null() {
        (*handle).column.cancel_update(request);
    }
}

/// Add tags to a selection.
///
/// `files_json` is a JSON array of `{path, is_dir}` and `tags_json` a JSON
/// array of unescaped tag names. Returns `RESULT_IN_PROGRESS` when the
/// command was queued; `callback`, if any, then runs once on the UI thread.
/// Returns `RESULT_FAILED` on invalid arguments or an empty tag list.
///
/// # Safety
/// The handle must be valid and both strings valid UTF-8 C strings.
/// `user_data` must stay valid until `callback` ran.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_add_tags(
    handle: *const TmsuExtension,
    files_json: *const c_char,
    tags_json: *const c_char,
    recursive: bool,
    callback: Option<DoneCallback>,
    user_data: *mut c_void,
) -> c_int {
    if handle.is_null() {
        return RESULT_FAILED;
    }
    let (Some(files), Some(tags)) = (files_arg(files_json), tags_arg(tags_json)) else {
        return RESULT_FAILED;
    };

    let user_data = UserData(user_data);
    let queued = (*handle).actions.add_tags_then(&files, &tags, recursive, move |success| {
        if let Some(callback) = callback {
            callback(success, user_data.get());
        }
    });

    match queued {
        Ok(()) => RESULT_IN_PROGRESS,
        Err(e) => {
            tracing::warn!("add tags rejected: {}", e);
            RESULT_FAILED
        }
    }
}

/// Apply the edit dialog's result to one file.
///
/// `current_json` and `edited_json` are JSON arrays of unescaped tag names.
/// Returns `RESULT_COMPLETE` when they hold the same tags, in which case
/// nothing runs and `callback` is never invoked. Otherwise returns
/// `RESULT_IN_PROGRESS` and `callback`, if any, runs once on the UI thread
/// after the last command.
///
/// # Safety
/// The handle must be valid and all strings valid UTF-8 C strings.
/// `user_data` must stay valid until `callback` ran.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_edit_tags(
    handle: *const TmsuExtension,
    path: *const c_char,
    is_dir: bool,
    current_json: *const c_char,
    edited_json: *const c_char,
    callback: Option<DoneCallback>,
    user_data: *mut c_void,
) -> c_int {
    if handle.is_null() {
        return RESULT_FAILED;
    }
    let (Some(path), Some(current), Some(edited)) = (str_arg(path), tags_arg(current_json), tags_arg(edited_json))
    else {
        return RESULT_FAILED;
    };

    let file = FileRef {
        path: path.into(),
        is_dir,
    };
    let user_data = UserData(user_data);
    let edit = (*handle).actions.edit_tags_then(&file, &current, &edited, move |success| {
        if let Some(callback) = callback {
            callback(success, user_data.get());
        }
    });

    match edit {
        Ok(edit) if edit.is_empty() => RESULT_COMPLETE,
        Ok(_) => RESULT_IN_PROGRESS,
        Err(e) => {
            tracing::warn!("tag edit rejected: {}", e);
            RESULT_FAILED
        }
    }
}

/// Load the tags of one file for the edit dialog.
///
/// `callback` runs once on the UI thread with a JSON array of unescaped tag
/// names, empty when the lookup failed.
///
/// # Safety
/// The handle must be valid and `path` a valid UTF-8 C string. `user_data`
/// must stay valid until `callback` ran.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_file_tags(
    handle: *const TmsuExtension,
    path: *const c_char,
    is_dir: bool,
    callback: Option<TagListCallback>,
    user_data: *mut c_void,
) -> c_int {
    if handle.is_null() {
        return RESULT_FAILED;
    }
    let (Some(path), Some(callback)) = (str_arg(path), callback) else {
        return RESULT_FAILED;
    };

    let file = FileRef {
        path: path.into(),
        is_dir,
    };
    let user_data = UserData(user_data);
    (*handle)
        .actions
        .load_tags(&file, move |tags| send_tag_list(callback, &tags, &user_data));
    RESULT_IN_PROGRESS
}

/// Load every tag of the database covering `dir`, for completion.
///
/// `callback` runs once on the UI thread with a JSON array of unescaped tag
/// names, empty when the lookup failed.
///
/// # Safety
/// The handle must be valid and `dir` a valid UTF-8 C string. `user_data`
/// must stay valid until `callback` ran.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_known_tags(
    handle: *const TmsuExtension,
    dir: *const c_char,
    callback: Option<TagListCallback>,
    user_data: *mut c_void,
) -> c_int {
    if handle.is_null() {
        return RESULT_FAILED;
    }
    let (Some(dir), Some(callback)) = (str_arg(dir), callback) else {
        return RESULT_FAILED;
    };

    let user_data = UserData(user_data);
    (*handle)
        .actions
        .load_known_tags(Path::new(dir), move |tags| send_tag_list(callback, &tags, &user_data));
    RESULT_IN_PROGRESS
}

/// Whether `dir` lies inside a tmsu database. Blocks on `tmsu info`.
///
/// # Safety
/// The handle must be valid and `dir` a valid UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_is_database(handle: *const TmsuExtension, dir: *const c_char) -> bool {
    if handle.is_null() {
        return false;
    }
    match str_arg(dir) {
        Some(dir) => (*handle).extension.is_tracked(Path::new(dir)),
        None => false,
    }
}

/// Menu items for a selection given as a JSON array of `{path, is_dir}`.
///
/// # Safety
/// The handle must be valid and `files_json` a valid UTF-8 C string. The
/// result must be freed with `nautilus_tmsu_string_free()`.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_menu_items_json(
    handle: *const TmsuExtension,
    files_json: *const c_char,
) -> *mut c_char {
    if handle.is_null() {
        return ptr::null_mut();
    }
    match files_arg(files_json) {
        Some(files) => to_json_ptr(&(*handle).menu.get_file_items(&files)),
        None => ptr::null_mut(),
    }
}

/// Properties models for a selection given as a JSON array of `{path, is_dir}`.
///
/// # Safety
/// The handle must be valid and `files_json` a valid UTF-8 C string. The
/// result must be freed with `nautilus_tmsu_string_free()`.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_properties_json(
    handle: *const TmsuExtension,
    files_json: *const c_char,
) -> *mut c_char {
    if handle.is_null() {
        return ptr::null_mut();
    }
    match files_arg(files_json) {
        Some(files) => to_json_ptr(&(*handle).properties.get_models(&files)),
        None => ptr::null_mut(),
    }
}

/// Free a string returned by this library.
///
/// # Safety
/// The pointer must have been returned by one of the `nautilus_tmsu_*`
/// functions, or be null.
#[no_mangle]
pub unsafe extern "C" fn nautilus_tmsu_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
