use crate::runtime::interpreter::Interpreter;

/// Words that read or change the interpreter itself: reset, includes, listings, throw, halt.
pub mod interpreter_words;

/// The word creation words, `:` and `;` and their modifiers.
pub mod word_creation_words;

/// The native control flow words: conditionals, loops, and try/catch.
pub mod control_words;

/// Compile time metaprogramming, direct access to instructions and code blocks.
pub mod bytecode_words;

/// Words for looking up and executing other words.
pub mod word_words;

/// Data stack shuffling words.
pub mod stack_words;

/// Arithmetic, comparison, logic, and bit manipulation.
pub mod math_words;

/// String inspection and editing words.
pub mod string_words;

/// Value type predicates and deep copying.
pub mod value_words;

/// Structure definition and access words.
pub mod struct_words;

/// Array container words.
pub mod array_words;

/// Hash table container words.
pub mod hash_words;

/// Byte buffer words.
pub mod buffer_words;

/// Sub-thread creation and messaging words.
pub mod thread_words;

/// Printing and file access words.
pub mod io_words;

/// Terminal control words.
pub mod terminal_words;

/// Words exposing the user's environment.
pub mod user_words;

/// Run time extension library loading.
pub mod module_words;

/// Register the complete native vocabulary with an interpreter.
pub fn register_built_in_words(interpreter: &mut dyn Interpreter) {
    interpreter_words::register_interpreter_words(interpreter);
    word_creation_words::register_word_creation_words(interpreter);
    control_words::register_control_words(interpreter);
    bytecode_words::register_bytecode_words(interpreter);
    word_words::register_word_words(interpreter);
    stack_words::register_stack_words(interpreter);
    math_words::register_math_words(interpreter);
    string_words::register_string_words(interpreter);
    value_words::register_value_words(interpreter);
    struct_words::register_struct_words(interpreter);
    array_words::register_array_words(interpreter);
    hash_words::register_hash_words(interpreter);
    buffer_words::register_buffer_words(interpreter);
    thread_words::register_thread_words(interpreter);
    io_words::register_io_words(interpreter);
    terminal_words::register_terminal_words(interpreter);
    user_words::register_user_words(interpreter);
    module_words::register_module_words(interpreter);
}
