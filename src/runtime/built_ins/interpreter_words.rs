use crate::{
    add_native_immediate_word, add_native_word,
    runtime::{
        data_structures::value::{ToValue, Value},
        error::{self, script_error, script_error_str},
        interpreter::Interpreter,
    },
};
use std::{thread, time::Duration};
use sysinfo::System;

/// Return the interpreter to its last known good state: drop the current context, clear the data
/// stack, and mark a fresh context.  Mostly used by the repl after a misbehaving line.
fn word_reset(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.reset()
}

/// Run another script file, the path comes from the stack at run time.
///
/// Signature: `source-path -- `
fn word_include(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.pop_as_string()?;

    interpreter.process_source_file(&path)
}

/// Run another script file at compile time, the path being the next token in the source.
fn word_include_im(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.next_token_text()?;

    interpreter.process_source_file(&path)
}

/// Print the data stack without disturbing it, top first.
fn word_print_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    println!("Depth: {}", interpreter.stack().len());

    for value in interpreter.stack().iter().rev() {
        if value.is_string() {
            println!("{}", Value::stringify(&value.get_string_val()));
        } else {
            println!("{}", value);
        }
    }

    Ok(())
}

/// Print the dictionary listing.
fn word_print_dictionary(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    print!("{}", interpreter.dictionary());
    Ok(())
}

/// Print the live sub-threads.
fn word_print_threads(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let threads = interpreter.sub_threads();

    println!("{} thread(s).", threads.len());

    for thread in threads {
        println!(
            "{:6}  {}{}  in: {}, out: {}",
            thread.id,
            thread.word_name,
            if thread.finished { "  (finished)" } else { "" },
            thread.pending_inputs,
            thread.pending_outputs
        );
    }

    Ok(())
}

/// Print the registered structure definitions.
fn word_print_structures(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    for definition in interpreter.structure_definitions() {
        println!("{}", definition);
    }

    Ok(())
}

/// The interpreter version string.
///
/// Signature: ` -- version`
fn word_version(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.push(env!("CARGO_PKG_VERSION").to_value());
    Ok(())
}

/// The current search paths as an array of strings.
///
/// Signature: ` -- paths`
fn word_search_path(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let paths = Value::from(interpreter.search_paths());

    interpreter.push(paths);
    Ok(())
}

/// Resolve a file against the search paths.
///
/// Signature: `path -- full-path`
fn word_find_file(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let path = interpreter.pop_as_string()?;
    let full_path = interpreter.find_file(&path)?;

    interpreter.push(full_path.to_value());
    Ok(())
}

/// The process's resident memory use in bytes.
///
/// Signature: ` -- bytes`
fn word_memory(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let mut system = System::new();

    system.refresh_all();

    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(error) => {
            return script_error(
                interpreter,
                format!("Could not read the process pid: {}.", error),
            );
        }
    };

    match system.process(pid) {
        Some(process) => {
            interpreter.push((process.memory() as i64).to_value());
            Ok(())
        }

        None => script_error_str(interpreter, "Could not read process memory information."),
    }
}

/// Raise a script error with the given message.  Caught by an enclosing try/catch, otherwise it
/// unwinds to the caller of the script.
///
/// Signature: `message -- `
fn word_throw(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let message = interpreter.pop_as_string()?;

    script_error(interpreter, message)
}

/// Raise the halt flag, stopping the byte-code loop after the current instruction.
fn word_halt(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.halt();
    Ok(())
}

/// Stop the interpreter, optionally popping a numeric exit code for the process.
///
/// Signature: `[exit-code] -- `
fn word_quit(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let top_is_numeric = interpreter
        .stack()
        .last()
        .map(|value| value.is_numeric())
        .unwrap_or(false);

    if top_is_numeric {
        let code = interpreter.pop_as_int()?;
        interpreter.set_exit_code(code);
    }

    interpreter.halt();
    Ok(())
}

/// Sleep the current thread.
///
/// Signature: `milliseconds -- `
fn word_sleep(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let milliseconds = interpreter.pop_as_int()?;

    if milliseconds > 0 {
        thread::sleep(Duration::from_millis(milliseconds as u64));
    }

    Ok(())
}

pub fn register_interpreter_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "reset",
        word_reset,
        "Reset the interpreter to its last known good state.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "include",
        word_include,
        "Run another source file, found through the search paths.",
        "source-path -- "
    );

    add_native_immediate_word!(
        interpreter,
        "[include]",
        word_include_im,
        "Run another source file at compile time, named by the next token.",
        " -- "
    );

    add_native_word!(
        interpreter,
        ".s",
        word_print_stack,
        "Print the data stack without changing it.",
        " -- "
    );

    add_native_word!(
        interpreter,
        ".w",
        word_print_dictionary,
        "Print the word dictionary.",
        " -- "
    );

    add_native_word!(
        interpreter,
        ".t",
        word_print_threads,
        "Print the live sub-threads.",
        " -- "
    );

    add_native_word!(
        interpreter,
        ".#",
        word_print_structures,
        "Print the registered structure definitions.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "sorth.version",
        word_version,
        "Get the interpreter's version string.",
        " -- version"
    );

    add_native_word!(
        interpreter,
        "sorth.search-path",
        word_search_path,
        "Get the script search paths.",
        " -- paths"
    );

    add_native_word!(
        interpreter,
        "sorth.find-file",
        word_find_file,
        "Resolve a file path against the search paths.",
        "path -- full-path"
    );

    add_native_word!(
        interpreter,
        "sorth.memory",
        word_memory,
        "Get the process's resident memory size.",
        " -- bytes"
    );

    add_native_word!(
        interpreter,
        "throw",
        word_throw,
        "Raise an error with the given message.",
        "message -- "
    );

    add_native_word!(
        interpreter,
        "halt",
        word_halt,
        "Stop the byte-code loop after the current instruction.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "quit",
        word_quit,
        "Stop the interpreter, optionally setting the process exit code.",
        "[exit-code] -- "
    );

    add_native_word!(
        interpreter,
        "exit_success",
        |interpreter| {
            interpreter.push(0i64.to_value());
            Ok(())
        },
        "The conventional success exit code.",
        " -- 0"
    );

    add_native_word!(
        interpreter,
        "exit_failure",
        |interpreter| {
            interpreter.push(1i64.to_value());
            Ok(())
        },
        "The conventional failure exit code.",
        " -- 1"
    );

    add_native_word!(
        interpreter,
        "ms",
        word_sleep,
        "Sleep the current thread for the given milliseconds.",
        "milliseconds -- "
    );
}
