use crate::{
    add_native_immediate_word,
    lang::{
        code::Op,
        compiler::{compile_token, compile_until_words},
        tokenizer::Token,
    },
    runtime::{
        data_structures::value::{ToValue, Value},
        error::{self, script_error_str},
        interpreter::{CodeManagement, Interpreter},
    },
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Generate a jump label that can't collide with any other construct in the program.
fn unique_label(tag: &str) -> Value {
    static INDEX: AtomicUsize = AtomicUsize::new(0);

    let index = INDEX.fetch_add(1, Ordering::Relaxed);
    Value::String(format!("{}-{:08x}", tag, index))
}

fn emit(interpreter: &mut dyn Interpreter, op: Op) -> error::Result<()> {
    interpreter.insert_user_instruction(None, op)
}

/// The structured `if`.  Compiles:
///
/// ```text
/// JumpIfZero else
/// <then branch>
/// Jump end
/// else: <else branch>
/// end:
/// ```
///
/// The else branch is optional, labels resolve when the enclosing construction completes.
fn word_if(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let else_label = unique_label("if-else");
    let end_label = unique_label("if-end");

    emit(interpreter, Op::JumpIfZero(else_label.clone()))?;

    let found = compile_until_words(interpreter, &["else", "then"])?;

    if found == "else" {
        emit(interpreter, Op::Jump(end_label.clone()))?;
        emit(interpreter, Op::JumpTarget(else_label))?;

        compile_until_words(interpreter, &["then"])?;

        emit(interpreter, Op::JumpTarget(end_label))?;
    } else {
        emit(interpreter, Op::JumpTarget(else_label))?;
    }

    Ok(())
}

/// The looping construct.  `begin ... until` runs until the popped flag is true, while
/// `begin ... while ... repeat` tests in the middle of each pass.  Either form compiles a
/// MarkLoopExit scope so break and continue can find their way around.
fn word_begin(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let top_label = unique_label("loop-top");
    let exit_label = unique_label("loop-exit");

    emit(interpreter, Op::MarkLoopExit(exit_label.clone()))?;
    emit(interpreter, Op::JumpTarget(top_label.clone()))?;

    let found = compile_until_words(interpreter, &["until", "while"])?;

    if found == "until" {
        emit(interpreter, Op::JumpIfZero(top_label))?;
        emit(interpreter, Op::JumpTarget(exit_label))?;
        emit(interpreter, Op::UnmarkLoopExit)?;
    } else {
        emit(interpreter, Op::JumpIfZero(exit_label.clone()))?;

        compile_until_words(interpreter, &["repeat"])?;

        emit(interpreter, Op::Jump(top_label))?;
        emit(interpreter, Op::JumpTarget(exit_label))?;
        emit(interpreter, Op::UnmarkLoopExit)?;
    }

    Ok(())
}

/// Leave the innermost loop from anywhere in its body.
fn word_break(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    emit(interpreter, Op::JumpLoopExit)
}

/// Restart the innermost loop from anywhere in its body.
fn word_continue(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    emit(interpreter, Op::JumpLoopStart)
}

/// The exception handling construct:
///
/// ```text
/// try <protected code> catch <handler> endcatch
/// ```
///
/// An error raised in the protected code lands at the handler with the error's message on the
/// stack.  When the protected code completes the handler is skipped.
fn word_try(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let catch_label = unique_label("catch");
    let end_label = unique_label("catch-end");

    emit(interpreter, Op::MarkCatch(catch_label.clone()))?;

    compile_until_words(interpreter, &["catch"])?;

    emit(interpreter, Op::UnmarkCatch)?;
    emit(interpreter, Op::Jump(end_label.clone()))?;
    emit(interpreter, Op::JumpTarget(catch_label))?;

    compile_until_words(interpreter, &["endcatch"])?;

    emit(interpreter, Op::JumpTarget(end_label))?;

    Ok(())
}

/// Declare a variable.  The name comes from the next token and the slot is allocated when the
/// declaration executes, so a variable inside a word body is allocated fresh per call within the
/// word's own context.
fn word_variable(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let token = interpreter.next_token()?;

    let name = match token {
        Token::Word(_, name) => name,
        Token::Number(_, number) => number.to_string(),

        Token::String(_, _) => {
            return script_error_str(interpreter, "A string can not be used as a variable name.");
        }
    };

    emit(interpreter, Op::DefVariable(name.to_value()))
}

/// Declare a constant whose value is popped from the stack when the declaration executes, as in
/// `60 60 * constant seconds-per-hour`.
fn word_constant(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let token = interpreter.next_token()?;

    let name = match token {
        Token::Word(_, name) => name,
        Token::Number(_, number) => number.to_string(),

        Token::String(_, _) => {
            return script_error_str(interpreter, "A string can not be used as a constant name.");
        }
    };

    emit(interpreter, Op::DefConstant(name.to_value()))
}

/// Read the variable whose index is on the stack.
fn word_variable_read(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    emit(interpreter, Op::ReadVariable)
}

/// Write to the variable whose index is on the stack.
fn word_variable_write(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    emit(interpreter, Op::WriteVariable)
}

/// The compile time conditional, `[if] ... [else] ... [then]`.  The flag is popped while the
/// source is compiling, only the winning branch's tokens compile at all.  Pairs with the compile
/// time predicates like [defined?].
fn word_compile_time_if(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    const ELSE_WORD: &str = "[else]";
    const THEN_WORD: &str = "[then]";

    // Discard tokens without compiling them until one of the given words shows up.
    fn skip_until(interpreter: &mut dyn Interpreter, words: &[&str]) -> error::Result<String> {
        loop {
            let token = interpreter.next_token()?;

            if let Token::Word(_, name) = &token {
                if words.iter().any(|word| word == name) {
                    return Ok(name.clone());
                }
            }
        }
    }

    // Compile tokens until one of the given words shows up.
    fn build_until(interpreter: &mut dyn Interpreter, words: &[&str]) -> error::Result<String> {
        loop {
            let token = interpreter.next_token()?;

            if let Token::Word(_, name) = &token {
                if words.iter().any(|word| word == name) {
                    return Ok(name.clone());
                }
            }

            compile_token(interpreter, token)?;
        }
    }

    let flag = interpreter.pop_as_bool()?;

    if flag {
        let found = build_until(interpreter, &[ELSE_WORD, THEN_WORD])?;

        if found == ELSE_WORD {
            skip_until(interpreter, &[THEN_WORD])?;
        }
    } else {
        let found = skip_until(interpreter, &[ELSE_WORD, THEN_WORD])?;

        if found == ELSE_WORD {
            build_until(interpreter, &[THEN_WORD])?;
        }
    }

    Ok(())
}

pub fn register_control_words(interpreter: &mut dyn Interpreter) {
    add_native_immediate_word!(
        interpreter,
        "if",
        word_if,
        "Run code conditionally, if <then-code> [else <else-code>] then.",
        "flag -- "
    );

    add_native_immediate_word!(
        interpreter,
        "begin",
        word_begin,
        "Start a loop, begin <code> until, or begin <code> while <code> repeat.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "break",
        word_break,
        "Exit the enclosing loop.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "continue",
        word_continue,
        "Restart the enclosing loop.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "try",
        word_try,
        "Protect code with an error handler, try <code> catch <handler> endcatch.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "variable",
        word_variable,
        "Declare a new variable named by the following word.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "constant",
        word_constant,
        "Declare a constant named by the following word, its value comes from the stack.",
        "value -- "
    );

    add_native_immediate_word!(
        interpreter,
        "@",
        word_variable_read,
        "Read the variable with the given index.",
        "variable-index -- value"
    );

    add_native_immediate_word!(
        interpreter,
        "!",
        word_variable_write,
        "Write to the variable with the given index.",
        "value variable-index -- "
    );

    add_native_immediate_word!(
        interpreter,
        "[if]",
        word_compile_time_if,
        "Compile time conditional, only the winning branch is compiled.",
        "[if] <code> [else] <code> [then]"
    );
}
