use crate::{
    add_native_word,
    runtime::{
        data_structures::value::ToValue,
        error::{self, script_error, script_error_str},
        interpreter::Interpreter,
    },
};
use lazy_static::lazy_static;
use std::{
    collections::HashMap,
    fs::{remove_file, File, OpenOptions},
    io::{BufRead, BufReader, Read, Seek, SeekFrom, Write},
    path::Path,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
};

// File handles are plain integers on the script side.  The backing File objects live in a
// process wide table so any interpreter thread can use a handle it has been given.
lazy_static! {
    static ref NEXT_FD: AtomicI64 = AtomicI64::new(4);
    static ref FILE_TABLE: Mutex<HashMap<i64, File>> = Mutex::new(HashMap::new());
}

const OPEN_READ: i64 = 0b01;
const OPEN_WRITE: i64 = 0b10;

fn register_file(file: File) -> i64 {
    let fd = NEXT_FD.fetch_add(1, Ordering::SeqCst);

    FILE_TABLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(fd, file);

    fd
}

/// Fetch an independent handle to a registered file.  Clones share the underlying OS file and
/// its cursor.
fn fetch_file(interpreter: &dyn Interpreter, fd: i64) -> error::Result<File> {
    let table = FILE_TABLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    match table.get(&fd) {
        Some(file) => match file.try_clone() {
            Ok(clone) => Ok(clone),
            Err(error) => script_error(
                interpreter,
                format!("Could not access the file for fd {}: {}.", fd, error),
            ),
        },

        None => script_error(interpreter, format!("No open file found for fd {}.", fd)),
    }
}

fn forget_file(interpreter: &dyn Interpreter, fd: i64) -> error::Result<()> {
    let removed = FILE_TABLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .remove(&fd);

    if removed.is_none() {
        return script_error(interpreter, format!("No open file found for fd {}.", fd));
    }

    Ok(())
}

fn open_options(flags: i64) -> OpenOptions {
    let mut options = OpenOptions::new();

    options.read(flags & OPEN_READ != 0);
    options.write(flags & OPEN_WRITE != 0);

    options
}

/// Print the top value followed by a space.
///
/// Signature: `value -- `
fn word_print(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    print!("{} ", value);

    let _ = std::io::stdout().flush();
    Ok(())
}

/// Print a line break.
fn word_print_newline(_interpreter: &mut dyn Interpreter) -> error::Result<()> {
    println!();
    Ok(())
}

/// Open an existing file.
///
/// Signature: `path flags -- fd`
fn word_file_open(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let flags = interpreter.pop_as_int()?;
    let path = interpreter.pop_as_string()?;

    let full_path = interpreter.find_file(&path)?;

    match open_options(flags).open(&full_path) {
        Ok(file) => {
            interpreter.push(register_file(file).to_value());
            Ok(())
        }

        Err(error) => script_error(
            interpreter,
            format!("Could not open the file {}: {}.", full_path, error),
        ),
    }
}

/// Create a file, or truncate an existing one.
///
/// Signature: `path flags -- fd`
fn word_file_create(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let flags = interpreter.pop_as_int()?;
    let path = interpreter.pop_as_string()?;

    let result = open_options(flags | OPEN_WRITE)
        .create(true)
        .truncate(true)
        .open(&path);

    match result {
        Ok(file) => {
            interpreter.push(register_file(file).to_value());
            Ok(())
        }

        Err(error) => script_error(
            interpreter,
            format!("Could not create the file {}: {}.", path, error),
        ),
    }
}

/// Close a file handle.
///
/// Signature: `fd -- `
fn word_file_close(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;

    forget_file(interpreter, fd)
}

/// Delete a file from the file system.
///
/// Signature: `path -- `
fn word_file_delete(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.pop_as_string()?;

    if let Err(error) = remove_file(&path) {
        return script_error(
            interpreter,
            format!("Could not delete the file {}: {}.", path, error),
        );
    }

    Ok(())
}

/// Does the given path name an existing file?
///
/// Signature: `path -- flag`
fn word_file_exists(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.pop_as_string()?;
    let exists = Path::new(&path).exists();

    interpreter.push(exists.to_value());
    Ok(())
}

/// Is the fd an open file handle?
///
/// Signature: `fd -- flag`
fn word_file_is_open(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;

    let is_open = FILE_TABLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .contains_key(&fd);

    interpreter.push(is_open.to_value());
    Ok(())
}

/// Is the file's cursor at the end of the file?
///
/// Signature: `fd -- flag`
fn word_file_is_eof(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;
    let mut file = fetch_file(interpreter, fd)?;

    let position = file.stream_position()?;
    let size = file.seek(SeekFrom::End(0))?;

    file.seek(SeekFrom::Start(position))?;

    interpreter.push((position >= size).to_value());
    Ok(())
}

/// The size of an open file in bytes.
///
/// Signature: `fd -- size`
fn word_file_size(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;
    let file = fetch_file(interpreter, fd)?;

    match file.metadata() {
        Ok(metadata) => {
            interpreter.push((metadata.len() as i64).to_value());
            Ok(())
        }

        Err(error) => script_error(
            interpreter,
            format!("Could not read the size of fd {}: {}.", fd, error),
        ),
    }
}

/// Read the remainder of a file as one string.
///
/// Signature: `fd -- text`
fn word_file_read_all(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;
    let mut file = fetch_file(interpreter, fd)?;
    let mut text = String::new();

    file.read_to_string(&mut text)?;

    interpreter.push(text.to_value());
    Ok(())
}

/// Read one line from a file, without the line ending.
///
/// Signature: `fd -- line`
fn word_file_read_line(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;
    let file = fetch_file(interpreter, fd)?;

    let mut reader = BufReader::new(file);
    let mut line = String::new();

    reader.read_line(&mut line)?;

    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    // The reader buffered ahead, put the underlying cursor back to just after the line.
    let consumed = reader.buffer().len() as i64;
    let mut file = reader.into_inner();

    file.seek(SeekFrom::Current(-consumed))?;

    interpreter.push(line.to_value());
    Ok(())
}

/// Write a string to a file followed by a line break.
///
/// Signature: `text fd -- `
fn word_file_write_line(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;
    let text = interpreter.pop_as_string()?;

    let mut file = fetch_file(interpreter, fd)?;

    writeln!(file, "{}", text)?;
    Ok(())
}

/// Write a value's text to a file.
///
/// Signature: `value fd -- `
fn word_file_write(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let fd = interpreter.pop_as_int()?;
    let value = interpreter.pop()?;

    if value.is_byte_buffer() {
        return script_error_str(interpreter, "Use buffer aware words to write binary data.");
    }

    let mut file = fetch_file(interpreter, fd)?;

    write!(file, "{}", value)?;
    Ok(())
}

pub fn register_io_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        ".",
        word_print,
        "Print the top value followed by a space.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "cr",
        word_print_newline,
        "Print a line break.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "file.open",
        word_file_open,
        "Open an existing file and push its fd.",
        "path flags -- fd"
    );

    add_native_word!(
        interpreter,
        "file.create",
        word_file_create,
        "Create or truncate a file and push its fd.",
        "path flags -- fd"
    );

    add_native_word!(
        interpreter,
        "file.close",
        word_file_close,
        "Close an open file handle.",
        "fd -- "
    );

    add_native_word!(
        interpreter,
        "file.delete",
        word_file_delete,
        "Delete the named file.",
        "path -- "
    );

    add_native_word!(
        interpreter,
        "file.exists?",
        word_file_exists,
        "Does the given path exist?",
        "path -- flag"
    );

    add_native_word!(
        interpreter,
        "file.is_open?",
        word_file_is_open,
        "Is the fd an open file handle?",
        "fd -- flag"
    );

    add_native_word!(
        interpreter,
        "file.is_eof?",
        word_file_is_eof,
        "Is the file's cursor at the end of the file?",
        "fd -- flag"
    );

    add_native_word!(
        interpreter,
        "file.size@",
        word_file_size,
        "The size of an open file in bytes.",
        "fd -- size"
    );

    add_native_word!(
        interpreter,
        "file.@",
        word_file_read_all,
        "Read the rest of a file as one string.",
        "fd -- text"
    );

    add_native_word!(
        interpreter,
        "file.line@",
        word_file_read_line,
        "Read one line from a file.",
        "fd -- line"
    );

    add_native_word!(
        interpreter,
        "file.line!",
        word_file_write_line,
        "Write a line of text to a file.",
        "text fd -- "
    );

    add_native_word!(
        interpreter,
        "file.!",
        word_file_write,
        "Write a value's text to a file.",
        "value fd -- "
    );

    add_native_word!(
        interpreter,
        "file.r/o",
        |interpreter| {
            interpreter.push(OPEN_READ.to_value());
            Ok(())
        },
        "Flag for opening a file read only.",
        " -- flags"
    );

    add_native_word!(
        interpreter,
        "file.w/o",
        |interpreter| {
            interpreter.push(OPEN_WRITE.to_value());
            Ok(())
        },
        "Flag for opening a file write only.",
        " -- flags"
    );

    add_native_word!(
        interpreter,
        "file.r/w",
        |interpreter| {
            interpreter.push((OPEN_READ | OPEN_WRITE).to_value());
            Ok(())
        },
        "Flag for opening a file for reading and writing.",
        " -- flags"
    );
}
