use crate::{
    add_native_word,
    runtime::{
        data_structures::value::Value,
        error::{self, script_error},
        interpreter::Interpreter,
    },
};

/// Start a word running on a new sub-thread and push the new thread's id.
///
/// The word is named by its handler index, usually produced with the tick word, as in
/// `` ` my-worker thread.new ``.  The sub-thread runs on a clone of this interpreter and talks
/// to the rest of the program through its input and output queues.
///
/// Signature: `word-index -- thread-id`
fn word_thread_new(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = interpreter.pop_as_usize()?;

    let word = {
        let handler_info = match interpreter.word_handler_info(index) {
            Some(info) => info,
            None => {
                return script_error(
                    interpreter,
                    format!("Word handler index {} not found.", index),
                );
            }
        };

        let name = handler_info.name().clone();

        match interpreter.find_word(&name) {
            Some(word) => word.clone(),
            None => {
                return script_error(
                    interpreter,
                    format!("Could not start a thread, the word {} was not found.", name),
                );
            }
        }
    };

    let id = interpreter.execute_word_threaded(&word)?;

    interpreter.push(Value::ThreadId(id));
    Ok(())
}

/// Send a value to another thread's input queue.
///
/// Signature: `value thread-id -- `
fn word_thread_push_to(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let id = interpreter.pop_as_thread_id()?;
    let value = interpreter.pop()?;

    interpreter.thread_push_input(id, value)
}

/// Receive a value from another thread's output queue, blocking until one is available.
///
/// Signature: `thread-id -- value`
fn word_thread_pop_from(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let id = interpreter.pop_as_thread_id()?;
    let value = interpreter.thread_pop_output(id)?;

    interpreter.push(value);
    Ok(())
}

/// Send a value to this thread's own output queue, where thread.pop-from can see it.
///
/// Signature: `value -- `
fn word_thread_push(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.thread_push_output(value)
}

/// Receive a value from this thread's own input queue, blocking until one is available.
///
/// Signature: ` -- value`
fn word_thread_pop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.thread_pop_input()?;

    interpreter.push(value);
    Ok(())
}

pub fn register_thread_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "thread.new",
        word_thread_new,
        "Run a word on a new sub-thread and push the thread's id.",
        "word-index -- thread-id"
    );

    add_native_word!(
        interpreter,
        "thread.push-to",
        word_thread_push_to,
        "Send a value to another thread's input queue.",
        "value thread-id -- "
    );

    add_native_word!(
        interpreter,
        "thread.pop-from",
        word_thread_pop_from,
        "Receive a value from another thread's output queue, blocking.",
        "thread-id -- value"
    );

    add_native_word!(
        interpreter,
        "thread.push",
        word_thread_push,
        "Send a value to this thread's output queue.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "thread.pop",
        word_thread_pop,
        "Receive a value from this thread's input queue, blocking.",
        " -- value"
    );
}
