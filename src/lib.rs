//! Strange Forth, an extensible Forth dialect hosted as a byte-code interpreter.
//!
//! Source text is tokenized and compiled to a small stack oriented byte-code, with the language's
//! immediate words running in the middle of compilation and free to reshape the code being
//! generated.  The interpreter executes that byte-code against a data stack, a scoped variable
//! store, and a dictionary of words.  Scripts can define words, structures, arrays, hash tables
//! and byte buffers, catch errors, and spawn cooperating sub-threads that talk over blocking
//! queues.
//!
//! The [`runtime::interpreter::strange_interpreter::StrangeInterpreter`] type ties everything
//! together, and [`runtime::built_ins::register_built_in_words`] installs the native vocabulary.

/// Source handling, tokenizing, byte-code and compilation.
#[macro_use]
pub mod lang;

/// The runtime: errors, data structures, the interpreter and the built-in words.
#[macro_use]
pub mod runtime;
