use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{DeepClone, ToValue, Value},
        error,
        interpreter::Interpreter,
    },
};

/// Generate a word that pops a value and pushes the result of one of the type predicates.
macro_rules! type_check_word {
    ($interpreter:expr, $name:expr, $test:expr, $description:expr) => {{
        let handler = move |interpreter: &mut dyn Interpreter| -> error::Result<()> {
            let value = interpreter.pop()?;
            let test: fn(&Value) -> bool = $test;

            interpreter.push(test(&value).to_value());
            Ok(())
        };

        add_native_word!($interpreter, $name, handler, $description, "value -- flag");
    }};
}

/// Replace the top value with a fully independent deep copy of it.
///
/// Signature: `value -- copied-value`
fn word_value_copy(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.push(value.deep_clone());
    Ok(())
}

pub fn register_value_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "none",
        |interpreter| {
            interpreter.push(Value::None);
            Ok(())
        },
        "Push the none value.",
        " -- none"
    );

    add_native_word!(
        interpreter,
        "true",
        |interpreter| {
            interpreter.push(true.to_value());
            Ok(())
        },
        "Push the boolean true.",
        " -- true"
    );

    add_native_word!(
        interpreter,
        "false",
        |interpreter| {
            interpreter.push(false.to_value());
            Ok(())
        },
        "Push the boolean false.",
        " -- false"
    );

    type_check_word!(
        interpreter,
        "value.is-none?",
        |value| value.is_none(),
        "Is the value none?"
    );

    type_check_word!(
        interpreter,
        "value.is-number?",
        |value| value.is_int() || value.is_float(),
        "Is the value a number?"
    );

    type_check_word!(
        interpreter,
        "value.is-boolean?",
        |value| value.is_bool(),
        "Is the value a boolean?"
    );

    type_check_word!(
        interpreter,
        "value.is-string?",
        |value| value.is_string(),
        "Is the value a string?"
    );

    type_check_word!(
        interpreter,
        "value.is-structure?",
        |value| value.is_structure(),
        "Is the value a structure?"
    );

    type_check_word!(
        interpreter,
        "value.is-array?",
        |value| value.is_array(),
        "Is the value an array?"
    );

    type_check_word!(
        interpreter,
        "value.is-hash-table?",
        |value| value.is_hash_table(),
        "Is the value a hash table?"
    );

    type_check_word!(
        interpreter,
        "value.is-buffer?",
        |value| value.is_byte_buffer(),
        "Is the value a byte buffer?"
    );

    type_check_word!(
        interpreter,
        "value.is-thread-id?",
        |value| value.is_thread_id(),
        "Is the value a thread id?"
    );

    type_check_word!(
        interpreter,
        "value.is-token?",
        |value| value.is_token(),
        "Is the value a source token?"
    );

    type_check_word!(
        interpreter,
        "value.is-code?",
        |value| value.is_code(),
        "Is the value a block of byte-code?"
    );

    add_native_word!(
        interpreter,
        "value.copy",
        word_value_copy,
        "Deep copy the top value.",
        "value -- copied-value"
    );
}
