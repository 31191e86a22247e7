use crate::{
    lang::source::SourceLocation,
    runtime::interpreter::{CallStack, Interpreter},
};
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    process::{ExitCode, Termination},
};

/// Result type used throughout the interpreter and its words.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Any failure raised while tokenizing, compiling, or running a script.  Errors carry the source
/// location they were raised from and the script call stack at the time, when either is known.
///
/// There is deliberately a single error type.  The catch words turn any of these back into a
/// plain message string on the data stack, and at the top level they print uniformly.
#[derive(Clone)]
pub struct ScriptError {
    location: Option<SourceLocation>,
    message: String,
    call_stack: Option<CallStack>,
}

impl Error for ScriptError {}

/// Returned from main on failure, print the error and exit unsuccessfully.
impl Termination for ScriptError {
    fn report(self) -> ExitCode {
        eprintln!("{}", self);
        ExitCode::FAILURE
    }
}

/// Errors format as `path:line:column: Error: message` followed by the script call stack,
/// innermost frame first.
impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: Error: {}", location, self.message)?,
            None => write!(f, "Error: {}", self.message)?,
        }

        if let Some(call_stack) = &self.call_stack {
            if !call_stack.is_empty() {
                write!(f, "\n\nCall stack:")?;

                for frame in call_stack.iter().rev() {
                    write!(f, "\n  {}", frame)?;
                }
            }
        }

        Ok(())
    }
}

impl Debug for ScriptError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl ScriptError {
    pub fn new(
        location: Option<SourceLocation>,
        message: String,
        call_stack: Option<CallStack>,
    ) -> ScriptError {
        ScriptError {
            location,
            message,
            call_stack,
        }
    }

    /// Build the error already wrapped in an Err for direct returns.
    pub fn new_as_result<T>(
        location: Option<SourceLocation>,
        message: String,
        call_stack: Option<CallStack>,
    ) -> Result<T> {
        Err(ScriptError::new(location, message, call_stack))
    }

    pub fn location(&self) -> &Option<SourceLocation> {
        &self.location
    }

    /// The bare message, without location or call stack.  This is the text that the catch words
    /// push onto the data stack.
    pub fn message(&self) -> &String {
        &self.message
    }

    pub fn call_stack(&self) -> &Option<CallStack> {
        &self.call_stack
    }
}

/// Let io errors flow through the ? operator in the file and source loading words.
impl From<std::io::Error> for ScriptError {
    fn from(error: std::io::Error) -> ScriptError {
        ScriptError::new(None, format!("I/O error: {}", error), None)
    }
}

/// Raise a script error from the interpreter's current execution position, capturing the call
/// stack for the report.
pub fn script_error<T>(interpreter: &dyn Interpreter, message: String) -> Result<T> {
    let location = interpreter.current_location().clone();
    let call_stack = interpreter.call_stack().clone();

    ScriptError::new_as_result(location, message, Some(call_stack))
}

pub fn script_error_str<T>(interpreter: &dyn Interpreter, message: &str) -> Result<T> {
    script_error(interpreter, message.to_string())
}
