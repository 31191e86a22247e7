use crate::{
    add_native_word,
    runtime::{
        data_structures::{array::Array, value::ToValue, SharedLock},
        error::{self, script_error, script_error_str},
        interpreter::Interpreter,
    },
};
use std::sync::Arc;

/// Create an array of the given size, every slot holding none.
///
/// Signature: `size -- array`
fn word_array_new(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let size = interpreter.pop_as_usize()?;
    let array = Array::new(size);

    interpreter.push(array.to_value());
    Ok(())
}

/// The element count of an array.
///
/// Signature: `array -- size`
fn word_array_size(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let size = array.locked().len();

    interpreter.push(size.to_value());
    Ok(())
}

/// Write a value into an array slot.
///
/// Signature: `value index array -- `
fn word_array_write(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let index = interpreter.pop_as_usize()?;
    let value = interpreter.pop()?;

    let mut array = array.locked();

    match array.get_mut(index) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }

        None => {
            let size = array.len();
            drop(array);

            script_error(
                interpreter,
                format!("Index {} is out of range for an array of size {}.", index, size),
            )
        }
    }
}

/// Read a value from an array slot.
///
/// Signature: `index array -- value`
fn word_array_read(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let index = interpreter.pop_as_usize()?;

    let value = {
        let array = array.locked();
        array.get(index).cloned()
    };

    match value {
        Some(value) => {
            interpreter.push(value);
            Ok(())
        }

        None => script_error(
            interpreter,
            format!(
                "Index {} is out of range for an array of size {}.",
                index,
                array.locked().len()
            ),
        ),
    }
}

/// Resize an array, new slots are filled with none.
///
/// Signature: `new-size array -- `
fn word_array_resize(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let new_size = interpreter.pop_as_usize()?;

    array.locked().resize(new_size);
    Ok(())
}

/// Insert a value at an index, shifting later values down.
///
/// Signature: `value index array -- `
fn word_array_insert(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let index = interpreter.pop_as_usize()?;
    let value = interpreter.pop()?;

    let mut array = array.locked();

    if index > array.len() {
        let size = array.len();
        drop(array);

        return script_error(
            interpreter,
            format!("Insert index {} is out of range for an array of size {}.", index, size),
        );
    }

    array.insert(index, value);
    Ok(())
}

/// Remove the value at an index.
///
/// Signature: `index array -- `
fn word_array_delete(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let index = interpreter.pop_as_usize()?;

    let removed = array.locked().remove(index);

    if removed.is_none() {
        return script_error(
            interpreter,
            format!(
                "Delete index {} is out of range for an array of size {}.",
                index,
                array.locked().len()
            ),
        );
    }

    Ok(())
}

/// Append deep copies of the second array's values onto the first, leaving the first on the
/// stack.
///
/// Signature: `dest source -- dest`
fn word_array_plus(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let source = interpreter.pop_as_array()?;
    let dest = interpreter.pop_as_array()?;

    // Appending an array to itself is fine, it just works from a snapshot.
    if Arc::ptr_eq(&source, &dest) {
        let snapshot = source.locked().clone();
        dest.locked().extend(&snapshot);
    } else {
        let source = source.locked();
        dest.locked().extend(&source);
    }

    interpreter.push(dest.to_value());
    Ok(())
}

/// Structurally compare two arrays.
///
/// Signature: `a b -- flag`
fn word_array_compare(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    if !a.is_array() || !b.is_array() {
        return script_error_str(interpreter, "Expected two arrays.");
    }

    interpreter.push((a == b).to_value());
    Ok(())
}

/// Push a value onto the front of an array.
///
/// Signature: `value array -- `
fn word_array_push_front(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let value = interpreter.pop()?;

    array.locked().push_front(value);
    Ok(())
}

/// Push a value onto the back of an array.
///
/// Signature: `value array -- `
fn word_array_push_back(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let value = interpreter.pop()?;

    array.locked().push_back(value);
    Ok(())
}

/// Pop the front value of an array.
///
/// Signature: `array -- value`
fn word_array_pop_front(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let value = array.locked().pop_front();

    match value {
        Some(value) => {
            interpreter.push(value);
            Ok(())
        }

        None => script_error_str(interpreter, "Pop from an empty array."),
    }
}

/// Pop the back value of an array.
///
/// Signature: `array -- value`
fn word_array_pop_back(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let value = array.locked().pop_back();

    match value {
        Some(value) => {
            interpreter.push(value);
            Ok(())
        }

        None => script_error_str(interpreter, "Pop from an empty array."),
    }
}

pub fn register_array_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "[].new",
        word_array_new,
        "Create an array of the given size.",
        "size -- array"
    );

    add_native_word!(
        interpreter,
        "[].size@",
        word_array_size,
        "Get the element count of an array.",
        "array -- size"
    );

    add_native_word!(
        interpreter,
        "[]!",
        word_array_write,
        "Write a value into an array slot.",
        "value index array -- "
    );

    add_native_word!(
        interpreter,
        "[]@",
        word_array_read,
        "Read a value from an array slot.",
        "index array -- value"
    );

    add_native_word!(
        interpreter,
        "[].size!",
        word_array_resize,
        "Resize an array, new slots hold none.",
        "new-size array -- "
    );

    add_native_word!(
        interpreter,
        "[].insert",
        word_array_insert,
        "Insert a value at an index of an array.",
        "value index array -- "
    );

    add_native_word!(
        interpreter,
        "[].delete",
        word_array_delete,
        "Remove the value at an index of an array.",
        "index array -- "
    );

    add_native_word!(
        interpreter,
        "[].+",
        word_array_plus,
        "Append deep copies of the source array's values onto the destination.",
        "dest source -- dest"
    );

    add_native_word!(
        interpreter,
        "[].=",
        word_array_compare,
        "Structurally compare two arrays.",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "[].push_front!",
        word_array_push_front,
        "Push a value onto the front of an array.",
        "value array -- "
    );

    add_native_word!(
        interpreter,
        "[].push_back!",
        word_array_push_back,
        "Push a value onto the back of an array.",
        "value array -- "
    );

    add_native_word!(
        interpreter,
        "[].pop_front!",
        word_array_pop_front,
        "Pop the front value of an array.",
        "array -- value"
    );

    add_native_word!(
        interpreter,
        "[].pop_back!",
        word_array_pop_back,
        "Pop the back value of an array.",
        "array -- value"
    );
}
