/// Source text handling: locations and the character cursor used by the tokenizer.
pub mod source;

/// Turning source text into the language's three token kinds.
pub mod tokenizer;

/// The byte-code instruction set of the virtual machine.
pub mod code;

/// Compiling token streams into byte-code.  Compilation is interwoven with execution, immediate
/// words run in the middle of it and can reshape the code being generated.
pub mod compiler;
