use crate::{
    add_native_immediate_word,
    runtime::{
        data_structures::value::Value,
        error::{self, script_error},
        interpreter::Interpreter,
    },
};
use lazy_static::lazy_static;
use libloading::Library;
use std::{
    ffi::{c_char, c_int, c_void, CStr, CString},
    sync::Mutex,
};

// The C ABI that extension libraries are written against.  A library exports
// register_module_words and receives a function table through which it can manipulate values,
// the data stack, and the word set of the interpreter that loaded it.

/// Opaque handle the C side uses to refer to a value.  Really a boxed Value.
type ValueRef = *mut Value;

/// Opaque handle the C side uses to refer to the calling interpreter.
type InterpreterRef = *mut c_void;

/// The result an extension word handler returns.  On failure the error message, when present, is
/// copied into the raised script error.
#[repr(C)]
pub struct HandlerResult {
    pub was_successful: c_int,
    pub error_message: *mut c_char,
}

/// An extension word's handler function.
type ExtWordHandler = unsafe extern "C" fn(InterpreterRef, *const ExtensionApi) -> HandlerResult;

/// The registration entry point every extension library exports.
type RegistrationFn = unsafe extern "C" fn(InterpreterRef, *const ExtensionApi);

/// The function table handed to extension libraries.
#[repr(C)]
pub struct ExtensionApi {
    pub new_value: unsafe extern "C" fn() -> ValueRef,
    pub free_value: unsafe extern "C" fn(ValueRef),

    pub as_int: unsafe extern "C" fn(InterpreterRef, ValueRef) -> i64,
    pub as_float: unsafe extern "C" fn(InterpreterRef, ValueRef) -> f64,
    pub as_bool: unsafe extern "C" fn(InterpreterRef, ValueRef) -> c_int,
    pub as_string: unsafe extern "C" fn(InterpreterRef, ValueRef) -> *mut c_char,
    pub free_string: unsafe extern "C" fn(*mut c_char),

    pub is_numeric: unsafe extern "C" fn(ValueRef) -> c_int,
    pub is_string: unsafe extern "C" fn(ValueRef) -> c_int,

    pub set_int: unsafe extern "C" fn(ValueRef, i64),
    pub set_float: unsafe extern "C" fn(ValueRef, f64),
    pub set_bool: unsafe extern "C" fn(ValueRef, c_int),
    pub set_string: unsafe extern "C" fn(ValueRef, *const c_char),

    pub halt: unsafe extern "C" fn(InterpreterRef),
    pub clear_halt_flag: unsafe extern "C" fn(InterpreterRef),

    pub push: unsafe extern "C" fn(InterpreterRef, ValueRef),
    pub pop: unsafe extern "C" fn(InterpreterRef) -> ValueRef,

    pub add_word: unsafe extern "C" fn(
        InterpreterRef,
        *const c_char,
        ExtWordHandler,
        *const c_char,
        usize,
        c_int,
        *const c_char,
        *const c_char,
    ),
}

lazy_static! {
    // Loaded extension libraries are kept alive for the life of the process, the word handlers
    // they registered are raw function pointers into their code.
    static ref LOADED_MODULES: Mutex<Vec<Library>> = Mutex::new(Vec::new());
}

/// Recover the interpreter reference that was packed into an InterpreterRef.
///
/// Safety: the handle is only ever created in this module, lives on the stack for the duration
/// of one extension call, and is never retained by well behaved extensions.
unsafe fn interpreter_from(handle: InterpreterRef) -> &'static mut dyn Interpreter {
    let pointer = handle as *mut &mut dyn Interpreter;
    unsafe { &mut **pointer }
}

unsafe extern "C" fn api_new_value() -> ValueRef {
    Box::into_raw(Box::new(Value::None))
}

unsafe extern "C" fn api_free_value(value: ValueRef) {
    if !value.is_null() {
        drop(unsafe { Box::from_raw(value) });
    }
}

unsafe extern "C" fn api_as_int(_interpreter: InterpreterRef, value: ValueRef) -> i64 {
    let value = unsafe { &*value };

    if value.is_numeric() { value.get_int_val() } else { 0 }
}

unsafe extern "C" fn api_as_float(_interpreter: InterpreterRef, value: ValueRef) -> f64 {
    let value = unsafe { &*value };

    if value.is_numeric() { value.get_float_val() } else { 0.0 }
}

unsafe extern "C" fn api_as_bool(_interpreter: InterpreterRef, value: ValueRef) -> c_int {
    let value = unsafe { &*value };

    value.get_bool_val() as c_int
}

unsafe extern "C" fn api_as_string(_interpreter: InterpreterRef, value: ValueRef) -> *mut c_char {
    let value = unsafe { &*value };

    let text = if value.is_stringable() {
        value.get_string_val()
    } else {
        value.to_string()
    };

    match CString::new(text) {
        Ok(text) => text.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

unsafe extern "C" fn api_free_string(text: *mut c_char) {
    if !text.is_null() {
        drop(unsafe { CString::from_raw(text) });
    }
}

unsafe extern "C" fn api_is_numeric(value: ValueRef) -> c_int {
    unsafe { &*value }.is_numeric() as c_int
}

unsafe extern "C" fn api_is_string(value: ValueRef) -> c_int {
    unsafe { &*value }.is_string() as c_int
}

unsafe extern "C" fn api_set_int(value: ValueRef, new_value: i64) {
    unsafe { *value = Value::Int(new_value) };
}

unsafe extern "C" fn api_set_float(value: ValueRef, new_value: f64) {
    unsafe { *value = Value::Float(new_value) };
}

unsafe extern "C" fn api_set_bool(value: ValueRef, new_value: c_int) {
    unsafe { *value = Value::Bool(new_value != 0) };
}

unsafe extern "C" fn api_set_string(value: ValueRef, new_value: *const c_char) {
    let text = if new_value.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(new_value) }.to_string_lossy().to_string()
    };

    unsafe { *value = Value::String(text) };
}

unsafe extern "C" fn api_halt(interpreter: InterpreterRef) {
    unsafe { interpreter_from(interpreter) }.halt();
}

unsafe extern "C" fn api_clear_halt_flag(interpreter: InterpreterRef) {
    unsafe { interpreter_from(interpreter) }.clear_halt_flag();
}

unsafe extern "C" fn api_push(interpreter: InterpreterRef, value: ValueRef) {
    let interpreter = unsafe { interpreter_from(interpreter) };
    let value = unsafe { &*value };

    interpreter.push(value.clone());
}

unsafe extern "C" fn api_pop(interpreter: InterpreterRef) -> ValueRef {
    let interpreter = unsafe { interpreter_from(interpreter) };

    match interpreter.pop() {
        Ok(value) => Box::into_raw(Box::new(value)),
        Err(_) => std::ptr::null_mut(),
    }
}

unsafe extern "C" fn api_add_word(
    interpreter: InterpreterRef,
    name: *const c_char,
    handler: ExtWordHandler,
    file: *const c_char,
    line: usize,
    is_immediate: c_int,
    description: *const c_char,
    signature: *const c_char,
) {
    fn text_from(pointer: *const c_char) -> String {
        if pointer.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(pointer) }.to_string_lossy().to_string()
        }
    }

    use crate::runtime::data_structures::dictionary::{WordKind, WordMode, WordVisibility};
    use std::sync::Arc;

    let interpreter = unsafe { interpreter_from(interpreter) };

    // The registered handler wraps the extension's function pointer, repacking the interpreter
    // reference on every call and translating failures into script errors.
    let wrapped = move |interpreter: &mut dyn Interpreter| -> error::Result<()> {
        let mut handle: &mut dyn Interpreter = &mut *interpreter;
        let handle_ref = &mut handle as *mut &mut dyn Interpreter as InterpreterRef;

        let result = unsafe { handler(handle_ref, &EXTENSION_API) };

        if result.was_successful != 0 {
            Ok(())
        } else {
            let message = if result.error_message.is_null() {
                "Extension word failed.".to_string()
            } else {
                unsafe { CStr::from_ptr(result.error_message) }
                    .to_string_lossy()
                    .to_string()
            };

            script_error(interpreter, message)
        }
    };

    interpreter.add_word(
        text_from(file),
        line,
        1,
        text_from(name),
        Arc::new(wrapped),
        text_from(description),
        text_from(signature),
        if is_immediate != 0 {
            WordMode::Immediate
        } else {
            WordMode::Normal
        },
        WordVisibility::Visible,
        WordKind::Native,
    );
}

/// The one shared function table handed to every loaded extension.
static EXTENSION_API: ExtensionApi = ExtensionApi {
    new_value: api_new_value,
    free_value: api_free_value,
    as_int: api_as_int,
    as_float: api_as_float,
    as_bool: api_as_bool,
    as_string: api_as_string,
    free_string: api_free_string,
    is_numeric: api_is_numeric,
    is_string: api_is_string,
    set_int: api_set_int,
    set_float: api_set_float,
    set_bool: api_set_bool,
    set_string: api_set_string,
    halt: api_halt,
    clear_halt_flag: api_clear_halt_flag,
    push: api_push,
    pop: api_pop,
    add_word: api_add_word,
};

/// The platform's shared library extension.
fn library_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

/// Load an extension library and let it register its words.
///
/// The library name is the next token in the source.  The platform's shared library extension is
/// appended, the file is resolved through the search paths, and its exported
/// register_module_words function is called with this interpreter and the API table.
fn word_module(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let name = interpreter.next_token_text()?;
    let file_name = format!("{}.{}", name, library_extension());
    let full_path = interpreter.find_file(&file_name)?;

    let library = match unsafe { Library::new(&full_path) } {
        Ok(library) => library,
        Err(error) => {
            return script_error(
                interpreter,
                format!("Could not load the module {}: {}.", full_path, error),
            );
        }
    };

    let registration = match unsafe {
        library.get::<RegistrationFn>(b"register_module_words\0")
    } {
        Ok(symbol) => *symbol,
        Err(error) => {
            return script_error(
                interpreter,
                format!(
                    "The module {} has no registration function: {}.",
                    full_path, error
                ),
            );
        }
    };

    {
        let mut handle: &mut dyn Interpreter = &mut *interpreter;
        let handle_ref = &mut handle as *mut &mut dyn Interpreter as InterpreterRef;

        unsafe { registration(handle_ref, &EXTENSION_API) };
    }

    // The library stays loaded, its handlers are live for the rest of the process.
    LOADED_MODULES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(library);

    Ok(())
}

pub fn register_module_words(interpreter: &mut dyn Interpreter) {
    add_native_immediate_word!(
        interpreter,
        "module",
        word_module,
        "Load an extension library and register its words.",
        " -- "
    );
}
