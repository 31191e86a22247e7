use crate::{
    add_native_immediate_word, add_native_word, location_here,
    lang::tokenizer::Token,
    runtime::{
        data_structures::{
            data_object::DataObjectDefinition,
            value::{ToValue, Value},
            SharedLock,
        },
        error::{self, script_error, script_error_str},
        interpreter::Interpreter,
    },
};

/// The structure definition syntax:
///
/// ```text
/// # point x y ;
/// # person hidden name -> "unknown" , age -> 0 ;
/// ```
///
/// The word after `#` names the structure, an optional `hidden` keeps the generated words out of
/// the dictionary listing, and each field can be given a literal default with `->`.  Commas
/// between fields are decorative.  Registering the definition also registers the whole family of
/// access words, see DataObjectDefinition::register_access_words.
fn word_define_structure(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let (location, name) = interpreter.next_token_word()?;

    let mut field_names: Vec<String> = Vec::new();
    let mut defaults: Vec<Value> = Vec::new();
    let mut is_hidden = false;

    loop {
        let token = interpreter.next_token()?;

        match &token {
            Token::Word(_, word) if word == ";" => break,
            Token::Word(_, word) if word == "," => continue,

            Token::Word(_, word) if word == "hidden" && field_names.is_empty() => {
                is_hidden = true;
            }

            Token::Word(_, word) if word == "->" => {
                if field_names.is_empty() {
                    return script_error_str(
                        interpreter,
                        "A field default must follow a field name.",
                    );
                }

                let default = parse_default(interpreter)?;
                let last = defaults.len() - 1;

                defaults[last] = default;
            }

            Token::Word(_, word) => {
                field_names.push(word.clone());
                defaults.push(Value::None);
            }

            Token::Number(_, number) => {
                field_names.push(number.to_string());
                defaults.push(Value::None);
            }

            Token::String(_, _) => {
                return script_error_str(interpreter, "Field names must be words.");
            }
        }
    }

    if field_names.is_empty() {
        return script_error(
            interpreter,
            format!("The structure {} has no fields.", name),
        );
    }

    let definition =
        DataObjectDefinition::new(interpreter, name, field_names, defaults, is_hidden);

    DataObjectDefinition::register_access_words(interpreter, definition, Some(location));

    Ok(())
}

/// A field default is a single literal token: a number, a string, or one of the words none, true
/// or false.
fn parse_default(interpreter: &mut dyn Interpreter) -> error::Result<Value> {
    let token = interpreter.next_token()?;

    match &token {
        Token::Number(_, number) => Ok(number.to_value()),
        Token::String(_, text) => Ok(text.to_value()),

        Token::Word(_, word) if word == "none" => Ok(Value::None),
        Token::Word(_, word) if word == "true" => Ok(true.to_value()),
        Token::Word(_, word) if word == "false" => Ok(false.to_value()),

        Token::Word(_, word) => script_error(
            interpreter,
            format!("The word {} is not usable as a field default.", word),
        ),
    }
}

/// Read a structure field by index.
///
/// Signature: `field-index structure -- value`
fn word_read_field(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = interpreter.pop_as_usize()?;
    let data = interpreter.pop_as_structure()?;

    let value = data.locked().read_field(interpreter, index)?;

    interpreter.push(value);
    Ok(())
}

/// Write a structure field by index.
///
/// Signature: `value field-index structure -- `
fn word_write_field(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let index = interpreter.pop_as_usize()?;
    let data = interpreter.pop_as_structure()?;
    let value = interpreter.pop()?;

    let result = data.locked().write_field(interpreter, index, value);
    result
}

/// Call a word for every field of a structure.  The callback sees `field-name value` on the
/// stack for each field.
///
/// Signature: `word-index structure -- `
fn word_structure_iterate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let data = interpreter.pop_as_structure()?;
    let word_index = interpreter.pop_as_usize()?;

    // Snapshot the fields so the callback is free to access the structure itself.
    let (names, values) = {
        let data = data.locked();

        (data.definition.field_names().clone(), data.fields.clone())
    };

    for (name, value) in names.iter().zip(values.into_iter()) {
        interpreter.push(name.to_value());
        interpreter.push(value);

        interpreter.execute_word_index(&location_here!(), word_index)?;
    }

    Ok(())
}

/// Does the structure have a field with the given name?
///
/// Signature: `field-name structure -- flag`
fn word_structure_field_exists(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let data = interpreter.pop_as_structure()?;
    let field_name = interpreter.pop_as_string()?;

    let found = data.locked().definition.field_index(&field_name).is_some();

    interpreter.push(found.to_value());
    Ok(())
}

/// Structural comparison of two structures.
///
/// Signature: `a b -- flag`
fn word_structure_compare(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    if !a.is_structure() || !b.is_structure() {
        return script_error_str(interpreter, "Expected two structures.");
    }

    interpreter.push((a == b).to_value());
    Ok(())
}

pub fn register_struct_words(interpreter: &mut dyn Interpreter) {
    add_native_immediate_word!(
        interpreter,
        "#",
        word_define_structure,
        "Define a new structure, # name [hidden] field [-> default] ... ;",
        " -- "
    );

    add_native_word!(
        interpreter,
        "#@",
        word_read_field,
        "Read a field from a structure by index.",
        "field-index structure -- value"
    );

    add_native_word!(
        interpreter,
        "#!",
        word_write_field,
        "Write to a field of a structure by index.",
        "value field-index structure -- "
    );

    add_native_word!(
        interpreter,
        "#.iterate",
        word_structure_iterate,
        "Call a word for every field name and value pair of a structure.",
        "word-index structure -- "
    );

    add_native_word!(
        interpreter,
        "#.field-exists?",
        word_structure_field_exists,
        "Check whether the structure has the named field.",
        "field-name structure -- flag"
    );

    add_native_word!(
        interpreter,
        "#.=",
        word_structure_compare,
        "Structurally compare two structures.",
        "a b -- flag"
    );
}
