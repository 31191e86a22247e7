use crate::{
    add_native_word,
    runtime::{
        data_structures::value::ToValue,
        error,
        interpreter::Interpreter,
    },
};

/// Duplicate the top value.
///
/// Signature: `value -- value value`
fn word_dup(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.push(value.clone());
    interpreter.push(value);

    Ok(())
}

/// Discard the top value.
///
/// Signature: `value -- `
fn word_drop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.pop()?;
    Ok(())
}

/// Exchange the top two values.
///
/// Signature: `a b -- b a`
fn word_swap(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(b);
    interpreter.push(a);

    Ok(())
}

/// Copy the second value over the top.
///
/// Signature: `a b -- a b a`
fn word_over(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(a.clone());
    interpreter.push(b);
    interpreter.push(a);

    Ok(())
}

/// Rotate the third value to the top.
///
/// Signature: `a b c -- b c a`
fn word_rot(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let c = interpreter.pop()?;
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(b);
    interpreter.push(c);
    interpreter.push(a);

    Ok(())
}

/// Remove the value at the given depth and bring it to the top.
///
/// Signature: `depth -- value`
fn word_pick(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.pop_as_usize()?;
    let value = interpreter.pick(depth)?;

    interpreter.push(value);
    Ok(())
}

/// Bury the top value at the given depth.
///
/// Signature: `value depth -- `
fn word_push_to(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.pop_as_usize()?;

    interpreter.push_to(depth)
}

/// Push the current stack depth.
///
/// Signature: ` -- depth`
fn word_depth(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.stack().len();

    interpreter.push(depth.to_value());
    Ok(())
}

/// Empty the data stack.
///
/// Signature: `... -- `
fn word_clear_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.clear_stack();
    Ok(())
}

/// Push the deepest the stack has been this run.
///
/// Signature: ` -- max-depth`
fn word_max_depth(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let max_depth = interpreter.stack_max_depth();

    interpreter.push(max_depth.to_value());
    Ok(())
}

pub fn register_stack_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "dup",
        word_dup,
        "Duplicate the top value on the stack.",
        "value -- value value"
    );

    add_native_word!(
        interpreter,
        "drop",
        word_drop,
        "Discard the top value on the stack.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "swap",
        word_swap,
        "Exchange the top two stack values.",
        "a b -- b a"
    );

    add_native_word!(
        interpreter,
        "over",
        word_over,
        "Copy the second stack value over the top.",
        "a b -- a b a"
    );

    add_native_word!(
        interpreter,
        "rot",
        word_rot,
        "Rotate the third stack value to the top.",
        "a b c -- b c a"
    );

    add_native_word!(
        interpreter,
        "pick",
        word_pick,
        "Pull the value at the given depth to the top.",
        "depth -- value"
    );

    add_native_word!(
        interpreter,
        "push-to",
        word_push_to,
        "Bury the top value at the given depth.",
        "value depth -- "
    );

    add_native_word!(
        interpreter,
        "depth",
        word_depth,
        "Push the current stack depth.",
        " -- depth"
    );

    add_native_word!(
        interpreter,
        "clearstack",
        word_clear_stack,
        "Discard everything on the data stack.",
        "... -- "
    );

    add_native_word!(
        interpreter,
        "stack.max-depth",
        word_max_depth,
        "Push the deepest the stack has reached.",
        " -- max-depth"
    );
}
