use crate::{
    lang::{
        code::{ByteCode, Instruction, Op},
        compiler::CompileContext,
        source::SourceLocation,
        tokenizer::{NumberKind, Token, TokenList},
    },
    runtime::{
        data_structures::{
            array::ArrayPtr,
            byte_buffer::ByteBufferPtr,
            contextual_list::{ContextualData, ContextualList},
            data_object::{DataDefinitionList, DataObjectDefinitionPtr, DataObjectPtr},
            dictionary::{Dictionary, Word, WordKind, WordMode, WordVisibility},
            hash_table::HashTablePtr,
            value::Value,
        },
        error,
    },
};
use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

/// The concrete interpreter.
pub mod strange_interpreter;

/// Sub-thread bookkeeping: the shared thread map and the blocking value queues.
pub mod sub_threads;

/// One frame of the script call stack: which word is running and where it was called from.  Used
/// purely for diagnostics, the VM's real control flow lives in Rust's own call stack.
#[derive(Clone)]
pub struct CallFrame {
    location: SourceLocation,
    word: String,
}

impl CallFrame {
    pub fn new(word: String, location: SourceLocation) -> CallFrame {
        CallFrame { location, word }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn word(&self) -> &String {
        &self.word
    }
}

/// Frames print in the shape used by error call stack traces.
impl Display for CallFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} -- {}", self.location, self.word)
    }
}

/// The script call stack, innermost frame last.
pub type CallStack = Vec<CallFrame>;

/// The interpreter's data stack.
pub type ValueStack = Vec<Value>;

/// The scoped list of script variables.  Slots are referenced by stable index from compiled code.
pub type VariableList = ContextualList<Value>;

/// The callable behind a word.  Native words are Rust functions or closures, scripted words are
/// closures that run their stored byte-code.  Handlers cross into sub-thread interpreters, so
/// they must be Send and Sync.
pub type WordHandler = dyn Fn(&mut dyn Interpreter) -> error::Result<()> + Send + Sync;

/// An entry in the word handler table, holding the callable along with the name and defining
/// location for diagnostics.
#[derive(Clone)]
pub struct WordHandlerInfo {
    name: String,
    location: SourceLocation,
    handler: Arc<WordHandler>,
}

impl WordHandlerInfo {
    pub fn new(name: String, location: SourceLocation, handler: Arc<WordHandler>) -> WordHandlerInfo {
        WordHandlerInfo {
            name,
            location,
            handler,
        }
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn handler(&self) -> Arc<WordHandler> {
        self.handler.clone()
    }
}

/// The scoped word handler table, kept index parallel with dictionary entries.
pub type HandlerList = ContextualList<WordHandlerInfo>;

/// Data stack operations, available to every word.
pub trait InterpreterStack {
    /// The deepest the data stack has been so far, for the stack.max-depth word.
    fn stack_max_depth(&self) -> usize;

    /// Read access to the whole stack, used by words like `.s` that display it.
    fn stack(&self) -> &ValueStack;

    /// Drop everything from the data stack.
    fn clear_stack(&mut self);

    fn push(&mut self, value: Value);

    /// Pop the top value, or fail with a stack underflow error.
    fn pop(&mut self) -> error::Result<Value>;

    fn pop_as_int(&mut self) -> error::Result<i64>;
    fn pop_as_usize(&mut self) -> error::Result<usize>;
    fn pop_as_float(&mut self) -> error::Result<f64>;
    fn pop_as_bool(&mut self) -> error::Result<bool>;
    fn pop_as_string(&mut self) -> error::Result<String>;
    fn pop_as_array(&mut self) -> error::Result<ArrayPtr>;
    fn pop_as_hash_table(&mut self) -> error::Result<HashTablePtr>;
    fn pop_as_structure(&mut self) -> error::Result<DataObjectPtr>;
    fn pop_as_byte_buffer(&mut self) -> error::Result<ByteBufferPtr>;
    fn pop_as_token(&mut self) -> error::Result<Token>;
    fn pop_as_code(&mut self) -> error::Result<ByteCode>;
    fn pop_as_thread_id(&mut self) -> error::Result<u64>;

    /// Remove and return the value at the given depth, 0 being the top.
    fn pick(&mut self, index: usize) -> error::Result<Value>;

    /// Move the top value down to the given depth.
    fn push_to(&mut self, index: usize) -> error::Result<()>;
}

/// Compilation state management.  These operations are only meaningful while a source is being
/// compiled and are intended to be called from immediate words.
pub trait CodeManagement {
    /// Take the next token from the current compile context, failing at end of stream.
    fn next_token(&mut self) -> error::Result<Token>;

    /// The next token's text, for word and string tokens.
    fn next_token_text(&mut self) -> error::Result<String>;

    /// The next token, which must be a string literal.
    fn next_token_string(&mut self) -> error::Result<String>;

    /// The next token, which must be a number.
    fn next_token_number(&mut self) -> error::Result<NumberKind>;

    /// The next token, which must be a word, along with its location.
    fn next_token_word(&mut self) -> error::Result<(SourceLocation, String)>;

    /// Is a source currently being compiled?  Words that read the token stream check this before
    /// touching the compile context.
    fn is_compiling(&self) -> bool;

    /// Stack a new compile context over the given token list.
    fn compile_context_new(&mut self, tokens: TokenList);

    /// Drop the current compile context.
    fn compile_context_drop(&mut self) -> error::Result<()>;

    /// The current compile context.  Panics when no compilation is in progress, which would be a
    /// bug in a word's implementation rather than a script error.
    fn compile_context(&self) -> &CompileContext;

    fn compile_context_mut(&mut self) -> &mut CompileContext;

    /// Append an instruction to the construction being compiled.
    fn insert_user_instruction(
        &mut self,
        location: Option<SourceLocation>,
        op: Op,
    ) -> error::Result<()> {
        self.compile_context_mut()
            .insert_instruction(Instruction::new(location, op))
    }

    /// Find, tokenize, compile and run a script file, managing the search path for includes
    /// relative to it.
    fn process_source_file(&mut self, path: &str) -> error::Result<()>;

    /// Tokenize, compile and run in-memory source text.  The path parameter only names the source
    /// for diagnostics, the repl passes "<repl>".
    fn process_source(&mut self, path: &str, source: &str) -> error::Result<()>;

    /// Run a block of byte-code.  The name is attributed to the block in call stacks and error
    /// traces.
    fn execute_code(&mut self, name: &str, code: &ByteCode) -> error::Result<()>;
}

/// Word registration, lookup and execution.
pub trait WordManagement {
    /// The source location execution has most recently reached, if any.
    fn current_location(&self) -> &Option<SourceLocation>;

    /// Register a word.  The handler goes into the handler table and the word record, pointing at
    /// it by index, goes into the dictionary.  Both land in the innermost scope.
    #[allow(clippy::too_many_arguments)]
    fn add_word(
        &mut self,
        file: String,
        line: usize,
        column: usize,
        name: String,
        handler: Arc<WordHandler>,
        description: String,
        signature: String,
        mode: WordMode,
        visibility: WordVisibility,
        kind: WordKind,
    );

    /// Register a structure definition in the innermost scope.
    fn add_structure_definition(&mut self, definition: DataObjectDefinitionPtr);

    fn find_word(&self, name: &str) -> Option<&Word>;

    fn word_handler_info(&self, index: usize) -> Option<&WordHandlerInfo>;

    /// Names indexed by handler index, for byte-code pretty printing.
    fn inverse_name_list(&self) -> Vec<String>;

    /// Execute a previously looked-up word.  The location names where the call is coming from,
    /// native callers can use location_here!().
    fn execute_word(&mut self, location: &SourceLocation, word: &Word) -> error::Result<()>;

    fn execute_word_named(&mut self, location: &SourceLocation, name: &str) -> error::Result<()>;

    fn execute_word_index(&mut self, location: &SourceLocation, index: usize)
        -> error::Result<()>;

    fn call_stack(&self) -> &CallStack;

    fn call_stack_push(&mut self, name: String, location: SourceLocation);

    fn call_stack_pop(&mut self) -> error::Result<()>;
}

/// A summary of one sub-thread for the `.t` listing.
#[derive(Clone)]
pub struct ThreadSummary {
    pub id: u64,
    pub word_name: String,
    pub finished: bool,
    pub pending_inputs: usize,
    pub pending_outputs: usize,
}

/// Sub-thread creation and the per-thread message queues.
///
/// Every interpreter clone shares the root ancestor's thread map, so any of them can address any
/// sub-thread by id.
pub trait ThreadManagement {
    /// Run a word on a new OS thread with a cloned interpreter, returning the new thread's id.
    fn execute_word_threaded(&mut self, word: &Word) -> error::Result<u64>;

    /// Push a value onto the input queue of the given thread.
    fn thread_push_input(&mut self, id: u64, value: Value) -> error::Result<()>;

    /// Pop a value from this interpreter's own input queue, blocking until one arrives.
    fn thread_pop_input(&mut self) -> error::Result<Value>;

    /// Push a value onto this interpreter's own output queue.
    fn thread_push_output(&mut self, value: Value) -> error::Result<()>;

    /// Pop a value from the output queue of the given thread, blocking until one arrives.
    fn thread_pop_output(&mut self, id: u64) -> error::Result<Value>;

    /// Snapshot the live sub-threads.
    fn sub_threads(&self) -> Vec<ThreadSummary>;
}

/// The full interpreter interface, the union of the concern traits plus the interpreter level
/// state: search paths, variables, the dictionary, halting and the exit code.
pub trait Interpreter:
    ContextualData + InterpreterStack + CodeManagement + WordManagement + ThreadManagement
{
    /// Add a search path for script files.  The path must exist.
    fn add_search_path(&mut self, path: &str) -> error::Result<()>;

    /// Add the parent directory of a file as a search path, so the file's own includes resolve.
    fn add_search_path_for_file(&mut self, file_path: &str) -> error::Result<()>;

    /// Drop the most recently added search path.
    fn drop_search_path(&mut self) -> error::Result<()>;

    fn search_paths(&self) -> &Vec<String>;

    /// Resolve a path to an existing absolute file.  Relative paths are tried against the search
    /// paths, most recently added first.
    fn find_file(&self, path: &str) -> error::Result<String>;

    fn variables(&self) -> &VariableList;

    fn dictionary(&self) -> &Dictionary;

    fn structure_definitions(&self) -> &DataDefinitionList;

    /// Throw away the current context and data stack and mark a fresh context, returning the
    /// interpreter to its last known good state.
    fn reset(&mut self) -> error::Result<()>;

    /// Raise the halt flag.  The VM polls it between instructions and stops after the current
    /// one.  Halting is cooperative, a blocked queue pop is not interrupted.
    fn halt(&mut self);

    fn clear_halt_flag(&mut self);

    fn is_halted(&self) -> bool;

    /// The process exit code this interpreter would like, set by the quit word.
    fn exit_code(&self) -> i64;

    fn set_exit_code(&mut self, code: i64);
}

/// Register a native word along with the Rust source location it was registered from.
#[macro_export]
macro_rules! add_native_word {
    ($interpreter:expr, $name:expr, $handler:expr, $description:expr, $signature:expr) => {{
        use std::sync::Arc;
        use $crate::runtime::data_structures::dictionary::{WordKind, WordMode, WordVisibility};

        $interpreter.add_word(
            file!().to_string(),
            line!() as usize,
            column!() as usize,
            $name.to_string(),
            Arc::new($handler),
            $description.to_string(),
            $signature.to_string(),
            WordMode::Normal,
            WordVisibility::Visible,
            WordKind::Native,
        );
    }};
}

/// Register a native immediate word, one that runs at compile time.
#[macro_export]
macro_rules! add_native_immediate_word {
    ($interpreter:expr, $name:expr, $handler:expr, $description:expr, $signature:expr) => {{
        use std::sync::Arc;
        use $crate::runtime::data_structures::dictionary::{WordKind, WordMode, WordVisibility};

        $interpreter.add_word(
            file!().to_string(),
            line!() as usize,
            column!() as usize,
            $name.to_string(),
            Arc::new($handler),
            $description.to_string(),
            $signature.to_string(),
            WordMode::Immediate,
            WordVisibility::Visible,
            WordKind::Native,
        );
    }};
}
