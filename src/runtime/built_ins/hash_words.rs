use crate::{
    add_native_word, location_here,
    runtime::{
        data_structures::{hash_table::HashTable, value::ToValue, SharedLock},
        error::{self, script_error, script_error_str},
        interpreter::Interpreter,
    },
};
use std::sync::Arc;

/// Create a new empty hash table.
///
/// Signature: ` -- hash-table`
fn word_hash_new(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.push(HashTable::new().to_value());
    Ok(())
}

/// Store a value under a key.
///
/// Signature: `value key table -- `
fn word_hash_insert(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let table = interpreter.pop_as_hash_table()?;
    let key = interpreter.pop()?;
    let value = interpreter.pop()?;

    // Floats don't make stable keys, equal-comparing values must hash equally.
    if key.is_float() {
        return script_error_str(interpreter, "Hash table keys can not be floats.");
    }

    table.locked().insert(key, value);
    Ok(())
}

/// Look up a key, raising an error when it's absent.
///
/// Signature: `key table -- value`
fn word_hash_find(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let table = interpreter.pop_as_hash_table()?;
    let key = interpreter.pop()?;

    let value = table.locked().get(&key).cloned();

    match value {
        Some(value) => {
            interpreter.push(value);
            Ok(())
        }

        None => script_error(interpreter, format!("Key {} not found in hash table.", key)),
    }
}

/// Does the table hold the given key?
///
/// Signature: `key table -- flag`
fn word_hash_exists(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let table = interpreter.pop_as_hash_table()?;
    let key = interpreter.pop()?;

    let found = table.locked().contains_key(&key);

    interpreter.push(found.to_value());
    Ok(())
}

/// Merge deep copies of the source table's entries into the destination, leaving the destination
/// on the stack.
///
/// Signature: `dest source -- dest`
fn word_hash_plus(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let source = interpreter.pop_as_hash_table()?;
    let dest = interpreter.pop_as_hash_table()?;

    if Arc::ptr_eq(&source, &dest) {
        let snapshot = source.locked().clone();
        dest.locked().extend(&snapshot);
    } else {
        let source = source.locked();
        dest.locked().extend(&source);
    }

    interpreter.push(dest.to_value());
    Ok(())
}

/// Structurally compare two hash tables.
///
/// Signature: `a b -- flag`
fn word_hash_compare(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    if !a.is_hash_table() || !b.is_hash_table() {
        return script_error_str(interpreter, "Expected two hash tables.");
    }

    interpreter.push((a == b).to_value());
    Ok(())
}

/// The entry count of a table.
///
/// Signature: `table -- size`
fn word_hash_size(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let table = interpreter.pop_as_hash_table()?;
    let size = table.locked().len();

    interpreter.push(size.to_value());
    Ok(())
}

/// Call a word for every entry of a table.  The callback sees `key value` on the stack for each
/// entry.
///
/// Signature: `word-index table -- `
fn word_hash_iterate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let table = interpreter.pop_as_hash_table()?;
    let word_index = interpreter.pop_as_usize()?;

    // Snapshot the entries so the callback can use the table freely.
    let entries: Vec<_> = {
        let table = table.locked();

        table
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    };

    for (key, value) in entries {
        interpreter.push(key);
        interpreter.push(value);

        interpreter.execute_word_index(&location_here!(), word_index)?;
    }

    Ok(())
}

pub fn register_hash_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "{}.new",
        word_hash_new,
        "Create a new hash table.",
        " -- hash-table"
    );

    add_native_word!(
        interpreter,
        "{}!",
        word_hash_insert,
        "Store a value under a key in the table.",
        "value key table -- "
    );

    add_native_word!(
        interpreter,
        "{}@",
        word_hash_find,
        "Read the value stored under a key in the table.",
        "key table -- value"
    );

    add_native_word!(
        interpreter,
        "{}?",
        word_hash_exists,
        "Check whether a key exists in the table.",
        "key table -- flag"
    );

    add_native_word!(
        interpreter,
        "{}.+",
        word_hash_plus,
        "Merge deep copies of the source table's entries into the destination.",
        "dest source -- dest"
    );

    add_native_word!(
        interpreter,
        "{}.=",
        word_hash_compare,
        "Structurally compare two hash tables.",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "{}.size@",
        word_hash_size,
        "Get the entry count of a hash table.",
        "table -- size"
    );

    add_native_word!(
        interpreter,
        "{}.iterate",
        word_hash_iterate,
        "Call a word for every key and value pair in the table.",
        "word-index table -- "
    );
}
