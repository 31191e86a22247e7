use crate::{
    add_native_word,
    lang::tokenizer,
    runtime::{
        data_structures::value::ToValue,
        error::{self, script_error},
        interpreter::Interpreter,
    },
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Map a character index to the byte index where that character starts.
fn char_to_byte_index(
    interpreter: &dyn Interpreter,
    string: &str,
    char_index: usize,
) -> error::Result<usize> {
    if char_index > string.chars().count() {
        return script_error(
            interpreter,
            format!("Character index {} is out of range for the string.", char_index),
        );
    }

    Ok(string
        .char_indices()
        .nth(char_index)
        .map(|(byte_index, _)| byte_index)
        .unwrap_or(string.len()))
}

/// The length of a string in characters.
///
/// Signature: `string -- size`
fn word_string_size(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;
    let size = string.chars().count();

    interpreter.push(size.to_value());
    Ok(())
}

/// Insert one string into another at a character position.
///
/// Signature: `sub-string position string -- updated-string`
fn word_string_insert(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let mut string = interpreter.pop_as_string()?;
    let position = interpreter.pop_as_usize()?;
    let sub_string = interpreter.pop_as_string()?;

    let byte_index = char_to_byte_index(interpreter, &string, position)?;

    string.insert_str(byte_index, &sub_string);

    interpreter.push(string.to_value());
    Ok(())
}

/// Remove a run of characters from a string.
///
/// Signature: `count position string -- updated-string`
fn word_string_remove(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let mut string = interpreter.pop_as_string()?;
    let position = interpreter.pop_as_usize()?;
    let count = interpreter.pop_as_usize()?;

    let char_count = string.chars().count();

    if position >= char_count {
        return script_error(
            interpreter,
            format!(
                "Position {} is out of range for a string of {} characters.",
                position, char_count
            ),
        );
    }

    let end = (position + count).min(char_count);
    let start_byte = char_to_byte_index(interpreter, &string, position)?;
    let end_byte = char_to_byte_index(interpreter, &string, end)?;

    string.drain(start_byte..end_byte);

    interpreter.push(string.to_value());
    Ok(())
}

/// Find the first occurrence of a sub-string, pushing its character index or -1.
///
/// Signature: `search-string string -- index`
fn word_string_find(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;
    let search = interpreter.pop_as_string()?;

    match string.find(&search) {
        Some(byte_index) => {
            let char_index = string[..byte_index].chars().count();
            interpreter.push(char_index.to_value());
        }

        None => interpreter.push((-1i64).to_value()),
    }

    Ok(())
}

/// Read the single character at a position, as a one character string.
///
/// Signature: `position string -- character`
fn word_string_index_read(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;
    let position = interpreter.pop_as_usize()?;

    match string.chars().nth(position) {
        Some(character) => {
            interpreter.push(character.to_string().to_value());
            Ok(())
        }

        None => script_error(
            interpreter,
            format!("Character index {} is out of range for the string.", position),
        ),
    }
}

/// Parse a string into a number, using the same rules as source literals.
///
/// Signature: `string -- number`
fn word_string_to_number(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let string = interpreter.pop_as_string()?;

    match tokenizer::to_number(&string) {
        Some(number) => {
            interpreter.push(number.to_value());
            Ok(())
        }

        None => script_error(
            interpreter,
            format!("Could not convert the string {} to a number.", string),
        ),
    }
}

/// Render any value to its textual form.
///
/// Signature: `value -- string`
fn word_to_string(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let text = interpreter.pop()?.to_string();

    interpreter.push(text.to_value());
    Ok(())
}

/// Format an integer as lowercase hex.
///
/// Signature: `number -- hex-string`
fn word_hex(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    let number = if value.is_float() {
        value.get_float_val().to_bits() as i64
    } else if value.is_numeric() {
        value.get_int_val()
    } else {
        return script_error(interpreter, format!("Value {} is not a number.", value));
    };

    interpreter.push(format!("{:x}", number).to_value());
    Ok(())
}

/// Generate a string no other call has produced, mostly used to make jump labels.
///
/// Signature: ` -- unique-string`
fn word_unique_str(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    static INDEX: AtomicUsize = AtomicUsize::new(0);

    let index = INDEX.fetch_add(1, Ordering::Relaxed);

    interpreter.push(format!("unique-{:08x}", index).to_value());
    Ok(())
}

pub fn register_string_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "string.size@",
        word_string_size,
        "Get the length of a string in characters.",
        "string -- size"
    );

    add_native_word!(
        interpreter,
        "string.[]!",
        word_string_insert,
        "Insert a string into another string.",
        "sub-string position string -- updated-string"
    );

    add_native_word!(
        interpreter,
        "string.remove",
        word_string_remove,
        "Remove a run of characters from a string.",
        "count position string -- updated-string"
    );

    add_native_word!(
        interpreter,
        "string.find",
        word_string_find,
        "Find a sub-string, pushing its index or npos.",
        "search-string string -- index"
    );

    add_native_word!(
        interpreter,
        "string.[]@",
        word_string_index_read,
        "Read the character at the given position.",
        "position string -- character"
    );

    add_native_word!(
        interpreter,
        "string.to_number",
        word_string_to_number,
        "Convert a string into a number.",
        "string -- number"
    );

    add_native_word!(
        interpreter,
        "to_string",
        word_to_string,
        "Convert any value to a string.",
        "value -- string"
    );

    add_native_word!(
        interpreter,
        "hex",
        word_hex,
        "Format a number as a hex string.",
        "number -- hex-string"
    );

    add_native_word!(
        interpreter,
        "unique_str",
        word_unique_str,
        "Generate a process-unique string.",
        " -- string"
    );

    add_native_word!(
        interpreter,
        "string.npos",
        |interpreter| {
            interpreter.push((-1i64).to_value());
            Ok(())
        },
        "The index pushed when a string search fails.",
        " -- npos"
    );
}
