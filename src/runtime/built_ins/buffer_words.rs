use crate::{
    add_native_word,
    runtime::{
        data_structures::{byte_buffer::ByteBuffer, value::ToValue, SharedLock},
        error,
        interpreter::Interpreter,
    },
};

/// Create a zero filled buffer of the given size.
///
/// Signature: `size -- buffer`
fn word_buffer_new(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let size = interpreter.pop_as_usize()?;

    interpreter.push(ByteBuffer::new_ptr(size).to_value());
    Ok(())
}

/// The byte size of a buffer.
///
/// Signature: `buffer -- size`
fn word_buffer_size(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let buffer = interpreter.pop_as_byte_buffer()?;
    let size = buffer.locked().len();

    interpreter.push(size.to_value());
    Ok(())
}

/// Resize a buffer, zero filling any new space.
///
/// Signature: `new-size buffer -- `
fn word_buffer_resize(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let buffer = interpreter.pop_as_byte_buffer()?;
    let new_size = interpreter.pop_as_usize()?;

    buffer.locked().resize(new_size);
    Ok(())
}

/// Write an integer at the buffer's cursor.  Valid widths are 1, 2, 4 and 8 bytes.
///
/// Signature: `value buffer byte-size -- `
fn word_buffer_write_int(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let byte_size = interpreter.pop_as_usize()?;
    let buffer = interpreter.pop_as_byte_buffer()?;
    let value = interpreter.pop_as_int()?;

    let result = buffer.locked().write_int(byte_size, value);
    result
}

/// Read an integer at the buffer's cursor, sign extending when asked.
///
/// Signature: `buffer byte-size is-signed -- value`
fn word_buffer_read_int(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let is_signed = interpreter.pop_as_bool()?;
    let byte_size = interpreter.pop_as_usize()?;
    let buffer = interpreter.pop_as_byte_buffer()?;

    let value = buffer.locked().read_int(byte_size, is_signed)?;

    interpreter.push(value.to_value());
    Ok(())
}

/// Write a float at the buffer's cursor.  Valid widths are 4 and 8 bytes.
///
/// Signature: `value buffer byte-size -- `
fn word_buffer_write_float(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let byte_size = interpreter.pop_as_usize()?;
    let buffer = interpreter.pop_as_byte_buffer()?;
    let value = interpreter.pop_as_float()?;

    let result = buffer.locked().write_float(byte_size, value);
    result
}

/// Read a float at the buffer's cursor.
///
/// Signature: `buffer byte-size -- value`
fn word_buffer_read_float(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let byte_size = interpreter.pop_as_usize()?;
    let buffer = interpreter.pop_as_byte_buffer()?;

    let value = buffer.locked().read_float(byte_size)?;

    interpreter.push(value.to_value());
    Ok(())
}

/// Write a string into a fixed size field at the buffer's cursor.
///
/// Signature: `value buffer max-size -- `
fn word_buffer_write_string(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let max_size = interpreter.pop_as_usize()?;
    let buffer = interpreter.pop_as_byte_buffer()?;
    let value = interpreter.pop_as_string()?;

    let result = buffer.locked().write_string(max_size, &value);
    result
}

/// Read a string from a fixed size field at the buffer's cursor.
///
/// Signature: `buffer max-size -- value`
fn word_buffer_read_string(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let max_size = interpreter.pop_as_usize()?;
    let buffer = interpreter.pop_as_byte_buffer()?;

    let value = buffer.locked().read_string(max_size)?;

    interpreter.push(value.to_value());
    Ok(())
}

/// Move a buffer's cursor.
///
/// Signature: `position buffer -- `
fn word_buffer_set_position(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let buffer = interpreter.pop_as_byte_buffer()?;
    let position = interpreter.pop_as_usize()?;

    let result = buffer.locked().set_position(position);
    result
}

/// Read a buffer's current cursor position.
///
/// Signature: `buffer -- position`
fn word_buffer_get_position(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let buffer = interpreter.pop_as_byte_buffer()?;
    let position = buffer.locked().position();

    interpreter.push(position.to_value());
    Ok(())
}

pub fn register_buffer_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "buffer.new",
        word_buffer_new,
        "Create a new byte buffer of the given size.",
        "size -- buffer"
    );

    add_native_word!(
        interpreter,
        "buffer.size@",
        word_buffer_size,
        "Get the byte size of a buffer.",
        "buffer -- size"
    );

    add_native_word!(
        interpreter,
        "buffer.size!",
        word_buffer_resize,
        "Resize a buffer, zero filling new space.",
        "new-size buffer -- "
    );

    add_native_word!(
        interpreter,
        "buffer.int!",
        word_buffer_write_int,
        "Write an integer of the given byte size at the cursor.",
        "value buffer byte-size -- "
    );

    add_native_word!(
        interpreter,
        "buffer.int@",
        word_buffer_read_int,
        "Read an integer of the given byte size at the cursor.",
        "buffer byte-size is-signed -- value"
    );

    add_native_word!(
        interpreter,
        "buffer.float!",
        word_buffer_write_float,
        "Write a float of the given byte size at the cursor.",
        "value buffer byte-size -- "
    );

    add_native_word!(
        interpreter,
        "buffer.float@",
        word_buffer_read_float,
        "Read a float of the given byte size at the cursor.",
        "buffer byte-size -- value"
    );

    add_native_word!(
        interpreter,
        "buffer.string!",
        word_buffer_write_string,
        "Write a string into a fixed size field at the cursor.",
        "value buffer max-size -- "
    );

    add_native_word!(
        interpreter,
        "buffer.string@",
        word_buffer_read_string,
        "Read a string from a fixed size field at the cursor.",
        "buffer max-size -- value"
    );

    add_native_word!(
        interpreter,
        "buffer.position!",
        word_buffer_set_position,
        "Move a buffer's cursor.",
        "position buffer -- "
    );

    add_native_word!(
        interpreter,
        "buffer.position@",
        word_buffer_get_position,
        "Read a buffer's current cursor position.",
        "buffer -- position"
    );
}
