use crate::{
    add_native_immediate_word, add_native_word, location_here,
    lang::code::Op,
    runtime::{
        data_structures::value::{ToValue, Value},
        error::{self, script_error, script_error_str},
        interpreter::Interpreter,
    },
};

/// Grab the next token from the source being compiled and push its text.  Only meaningful while
/// compilation is in progress, which is to say from inside an immediate word.
fn word_next_word(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    if !interpreter.is_compiling() {
        return script_error_str(interpreter, "word can only be used during compilation.");
    }

    let text = interpreter.next_token_text()?;

    interpreter.push(text.to_value());
    Ok(())
}

/// The tick word.  Reads the next token as a word name and compiles a lookup that pushes the
/// word's handler index at run time.
fn word_tick(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (_, name) = interpreter.next_token_word()?;

    interpreter.insert_user_instruction(None, Op::WordIndex(name.to_value()))
}

/// Execute a word given its name or handler index on the stack.
fn word_execute(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;
    let location = location_here!();

    match value {
        Value::Int(index) => interpreter.execute_word_index(&location, index as usize),

        value if value.is_stringable() => {
            let name = value.get_string_val();
            interpreter.execute_word_named(&location, &name)
        }

        _ => script_error(
            interpreter,
            format!("Value {} is not a word name or index.", value),
        ),
    }
}

/// Is a word with the given name currently defined?
fn word_is_defined(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let name = interpreter.pop_as_string()?;
    let found = interpreter.find_word(&name).is_some();

    interpreter.push(found.to_value());
    Ok(())
}

/// Compile time check for whether the next token names a defined word.  The answer lands on the
/// stack during compilation, where [if] can pick it up.
fn word_is_defined_im(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let name = interpreter.next_token_text()?;
    let found = interpreter.find_word(&name).is_some();

    interpreter.push(found.to_value());
    Ok(())
}

/// The inverse of [defined?].
fn word_is_undefined_im(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let name = interpreter.next_token_text()?;
    let found = interpreter.find_word(&name).is_some();

    interpreter.push((!found).to_value());
    Ok(())
}

pub fn register_word_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "word",
        word_next_word,
        "Get the next token from the source as a string.",
        " -- next-token-text"
    );

    add_native_immediate_word!(
        interpreter,
        "`",
        word_tick,
        "Compile a lookup of the following word's handler index.",
        " -- word-index"
    );

    add_native_word!(
        interpreter,
        "execute",
        word_execute,
        "Execute a word by name or handler index.",
        "name-or-index -- "
    );

    add_native_word!(
        interpreter,
        "defined?",
        word_is_defined,
        "Check if a word with the given name is defined.",
        "name -- flag"
    );

    add_native_immediate_word!(
        interpreter,
        "[defined?]",
        word_is_defined_im,
        "Compile time check of whether the following word is defined.",
        " -- flag"
    );

    add_native_immediate_word!(
        interpreter,
        "[undefined?]",
        word_is_undefined_im,
        "Compile time check of whether the following word is undefined.",
        " -- flag"
    );
}
