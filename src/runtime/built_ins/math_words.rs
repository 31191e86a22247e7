use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{ToValue, Value},
        error::{self, script_error_str},
        interpreter::Interpreter,
    },
};
use std::cmp::Ordering;

/// Shared plumbing for the binary operations that work on either floats or integers.  The operand
/// pops, numeric coercion, and result push all happen here.
fn math_op(
    interpreter: &mut dyn Interpreter,
    float_op: fn(f64, f64) -> f64,
    int_op: fn(i64, i64) -> i64,
) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    if !Value::both_are_numeric(&a, &b) {
        return script_error_str(interpreter, "Expected numeric values.");
    }

    let result = if Value::either_is_float(&a, &b) {
        float_op(a.get_float_val(), b.get_float_val()).to_value()
    } else {
        int_op(a.get_int_val(), b.get_int_val()).to_value()
    };

    interpreter.push(result);
    Ok(())
}

/// Like math_op but for operations that also make sense on strings, which is how `+` gets its
/// concatenation behavior.
fn string_or_math_op(
    interpreter: &mut dyn Interpreter,
    string_op: fn(String, String) -> String,
    float_op: fn(f64, f64) -> f64,
    int_op: fn(i64, i64) -> i64,
) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    if Value::either_is_string(&a, &b) {
        if !a.is_stringable() || !b.is_stringable() {
            return script_error_str(interpreter, "Value is not convertible to a string.");
        }

        let result = string_op(a.get_string_val(), b.get_string_val());

        interpreter.push(result.to_value());
        return Ok(());
    }

    if !Value::both_are_numeric(&a, &b) {
        return script_error_str(interpreter, "Expected numeric or string values.");
    }

    let result = if Value::either_is_float(&a, &b) {
        float_op(a.get_float_val(), b.get_float_val()).to_value()
    } else {
        int_op(a.get_int_val(), b.get_int_val()).to_value()
    };

    interpreter.push(result);
    Ok(())
}

/// Shared plumbing for the bitwise operations, integers only.
fn bit_op(interpreter: &mut dyn Interpreter, op: fn(i64, i64) -> i64) -> error::Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    interpreter.push(op(a, b).to_value());
    Ok(())
}

/// Shared plumbing for the boolean logic operations.
fn logic_op(interpreter: &mut dyn Interpreter, op: fn(bool, bool) -> bool) -> error::Result<()> {
    let b = interpreter.pop_as_bool()?;
    let a = interpreter.pop_as_bool()?;

    interpreter.push(op(a, b).to_value());
    Ok(())
}

/// Shared plumbing for the comparison words, using the value system's deterministic ordering.
fn comparison_op(
    interpreter: &mut dyn Interpreter,
    accept: fn(Ordering) -> bool,
) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    let ordering = match a.partial_cmp(&b) {
        Some(ordering) => ordering,
        None => return script_error_str(interpreter, "Values are not comparable."),
    };

    interpreter.push(accept(ordering).to_value());
    Ok(())
}

/// Division and modulo guard against a zero divisor instead of crashing the interpreter.
fn checked_div(interpreter: &mut dyn Interpreter, modulo: bool) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    if !Value::both_are_numeric(&a, &b) {
        return script_error_str(interpreter, "Expected numeric values.");
    }

    if Value::either_is_float(&a, &b) {
        let divisor = b.get_float_val();

        if divisor == 0.0 {
            return script_error_str(interpreter, "Division by zero.");
        }

        let result = if modulo {
            a.get_float_val() % divisor
        } else {
            a.get_float_val() / divisor
        };

        interpreter.push(result.to_value());
    } else {
        let divisor = b.get_int_val();

        if divisor == 0 {
            return script_error_str(interpreter, "Division by zero.");
        }

        let result = if modulo {
            a.get_int_val() % divisor
        } else {
            a.get_int_val() / divisor
        };

        interpreter.push(result.to_value());
    }

    Ok(())
}

pub fn register_math_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "+",
        |interpreter| {
            string_or_math_op(
                interpreter,
                |a, b| a + &b,
                |a, b| a + b,
                |a, b| a.wrapping_add(b),
            )
        },
        "Add two numbers, or concatenate two strings.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "-",
        |interpreter| math_op(interpreter, |a, b| a - b, |a, b| a.wrapping_sub(b)),
        "Subtract the top value from the one below it.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "*",
        |interpreter| math_op(interpreter, |a, b| a * b, |a, b| a.wrapping_mul(b)),
        "Multiply two numbers.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "/",
        |interpreter| checked_div(interpreter, false),
        "Divide the second value by the top.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "%",
        |interpreter| checked_div(interpreter, true),
        "The remainder of dividing the second value by the top.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "&&",
        |interpreter| logic_op(interpreter, |a, b| a && b),
        "Boolean and of the top two values.",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "||",
        |interpreter| logic_op(interpreter, |a, b| a || b),
        "Boolean or of the top two values.",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "'",
        |interpreter| {
            let value = interpreter.pop_as_bool()?;

            interpreter.push((!value).to_value());
            Ok(())
        },
        "Boolean not of the top value.",
        "flag -- flag"
    );

    add_native_word!(
        interpreter,
        "&",
        |interpreter| bit_op(interpreter, |a, b| a & b),
        "Bitwise and.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "|",
        |interpreter| bit_op(interpreter, |a, b| a | b),
        "Bitwise or.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "^",
        |interpreter| bit_op(interpreter, |a, b| a ^ b),
        "Bitwise exclusive or.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "~",
        |interpreter| {
            let value = interpreter.pop_as_int()?;

            interpreter.push((!value).to_value());
            Ok(())
        },
        "Bitwise complement of the top value.",
        "a -- result"
    );

    add_native_word!(
        interpreter,
        "<<",
        |interpreter| bit_op(interpreter, |a, b| a.wrapping_shl(b as u32)),
        "Shift the second value left by the top.",
        "value amount -- result"
    );

    add_native_word!(
        interpreter,
        ">>",
        |interpreter| bit_op(interpreter, |a, b| a.wrapping_shr(b as u32)),
        "Shift the second value right by the top.",
        "value amount -- result"
    );

    add_native_word!(
        interpreter,
        "=",
        |interpreter| {
            let b = interpreter.pop()?;
            let a = interpreter.pop()?;

            interpreter.push((a == b).to_value());
            Ok(())
        },
        "Are the top two values equal?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<>",
        |interpreter| {
            let b = interpreter.pop()?;
            let a = interpreter.pop()?;

            interpreter.push((a != b).to_value());
            Ok(())
        },
        "Are the top two values different?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<",
        |interpreter| comparison_op(interpreter, |ordering| ordering == Ordering::Less),
        "Is the second value less than the top?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        ">",
        |interpreter| comparison_op(interpreter, |ordering| ordering == Ordering::Greater),
        "Is the second value greater than the top?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "<=",
        |interpreter| comparison_op(interpreter, |ordering| ordering != Ordering::Greater),
        "Is the second value less than or equal to the top?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        ">=",
        |interpreter| comparison_op(interpreter, |ordering| ordering != Ordering::Less),
        "Is the second value greater than or equal to the top?",
        "a b -- flag"
    );
}
