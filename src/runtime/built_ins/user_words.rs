use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{ToValue, Value},
        error,
        interpreter::Interpreter,
    },
};
use std::env;

/// Read an environment variable, pushing none when it isn't set.
///
/// Signature: `name -- value`
fn word_user_env_read(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let name = interpreter.pop_as_string()?;

    match env::var(&name) {
        Ok(value) => interpreter.push(value.to_value()),
        Err(_) => interpreter.push(Value::None),
    }

    Ok(())
}

/// The name of the operating system the interpreter was built for.
///
/// Signature: ` -- os-name`
fn word_user_os(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.push(env::consts::OS.to_value());
    Ok(())
}

/// The user's home directory, if the environment reports one.
///
/// Signature: ` -- path`
fn word_user_home(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    match env::var("HOME").or_else(|_| env::var("USERPROFILE")) {
        Ok(path) => interpreter.push(path.to_value()),
        Err(_) => interpreter.push(Value::None),
    }

    Ok(())
}

/// The process's current working directory.
///
/// Signature: ` -- path`
fn word_user_cwd(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let cwd = env::current_dir()?;

    interpreter.push(cwd.to_string_lossy().to_string().to_value());
    Ok(())
}

pub fn register_user_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "user.env@",
        word_user_env_read,
        "Read an environment variable, none when unset.",
        "name -- value"
    );

    add_native_word!(
        interpreter,
        "user.os",
        word_user_os,
        "The name of the host operating system.",
        " -- os-name"
    );

    add_native_word!(
        interpreter,
        "user.home@",
        word_user_home,
        "The user's home directory.",
        " -- path"
    );

    add_native_word!(
        interpreter,
        "user.cwd@",
        word_user_cwd,
        "The process's current working directory.",
        " -- path"
    );
}
