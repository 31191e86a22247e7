use crate::{
    add_native_immediate_word,
    lang::{compiler::Construction, tokenizer::Token},
    runtime::{
        data_structures::dictionary::{WordContext, WordKind, WordMode, WordVisibility},
        error::{self, script_error_str},
        interpreter::Interpreter,
    },
};
use std::sync::Arc;

/// Begin a new word definition.  The word's name is the next token in the stream, everything up
/// to `;` compiles into the new word's construction.
fn word_start_definition(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let token = interpreter.next_token()?;

    let (location, name) = match token {
        Token::Word(location, name) => (location, name),
        Token::Number(location, number) => (location, number.to_string()),

        Token::String(_, _) => {
            return script_error_str(interpreter, "A string can not be used as a word name.");
        }
    };

    let mut construction = Construction::new();

    construction.name = name;
    construction.location = location;

    interpreter.compile_context_mut().push_construction(construction);

    Ok(())
}

/// Close the current word definition, resolve its jumps, and register it in the dictionary.
fn word_end_definition(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let mut construction = interpreter.compile_context_mut().pop_construction()?;

    construction.resolve_jumps();

    let name = construction.name.clone();
    let context = construction.context;
    let code = construction.code;

    // The handler for a scripted word runs the stored byte-code, bracketed by an automatic
    // scope for the word's local variables unless the word opted out with contextless.
    let handler = move |interpreter: &mut dyn Interpreter| -> error::Result<()> {
        use crate::runtime::data_structures::contextual_list::ContextualData;

        if context == WordContext::Managed {
            interpreter.mark_context();
        }

        let result = interpreter.execute_code(&name, &code);

        if context == WordContext::Managed {
            interpreter.release_context();
        }

        result
    };

    interpreter.add_word(
        construction.location.path().clone(),
        construction.location.line(),
        construction.location.column(),
        construction.name,
        Arc::new(handler),
        construction.description,
        construction.signature,
        construction.mode,
        construction.visibility,
        WordKind::Scripted,
    );

    Ok(())
}

/// Mark the word being defined as immediate.
fn word_immediate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.compile_context_mut().construction_mut()?.mode = WordMode::Immediate;
    Ok(())
}

/// Hide the word being defined from the dictionary listing.
fn word_hidden(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.compile_context_mut().construction_mut()?.visibility = WordVisibility::Hidden;
    Ok(())
}

/// Opt the word being defined out of automatic context management.
fn word_contextless(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.compile_context_mut().construction_mut()?.context = WordContext::Manual;
    Ok(())
}

/// Attach a description to the word being defined.
fn word_description(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let description = interpreter.next_token_string()?;

    interpreter.compile_context_mut().construction_mut()?.description = description;
    Ok(())
}

/// Document the stack signature of the word being defined.
fn word_signature(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let signature = interpreter.next_token_string()?;

    interpreter.compile_context_mut().construction_mut()?.signature = signature;
    Ok(())
}

pub fn register_word_creation_words(interpreter: &mut dyn Interpreter) {
    add_native_immediate_word!(
        interpreter,
        ":",
        word_start_definition,
        "Start a new word definition.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        ";",
        word_end_definition,
        "Finish and register the word being defined.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "immediate",
        word_immediate,
        "Mark the new word as immediate.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "hidden",
        word_hidden,
        "Hide the new word from the dictionary listing.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "contextless",
        word_contextless,
        "Disable automatic context management for the new word.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "description:",
        word_description,
        "Give a description to the new word.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "signature:",
        word_signature,
        "Document the new word's stack signature.",
        " -- "
    );
}
