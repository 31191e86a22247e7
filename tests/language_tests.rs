// End to end coverage of the language: definitions, scoping, structures, exceptions, the
// compile time words, and the printed value round trip.

use sorth::runtime::built_ins::register_built_in_words;
use sorth::runtime::data_structures::contextual_list::ContextualData;
use sorth::runtime::data_structures::value::{DeepClone, ToValue, Value};
use sorth::runtime::data_structures::SharedLock;
use sorth::runtime::interpreter::strange_interpreter::StrangeInterpreter;
use sorth::runtime::interpreter::{CodeManagement, InterpreterStack};

fn new_interpreter() -> StrangeInterpreter {
    let mut interpreter = StrangeInterpreter::new();

    register_built_in_words(&mut interpreter);
    interpreter
}

fn run(interpreter: &mut StrangeInterpreter, source: &str) {
    interpreter.process_source("<test>", source).unwrap();
}

#[test]
fn arithmetic_and_print_leave_an_empty_stack() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "2 3 + .");

    assert!(interpreter.stack().is_empty());
}

#[test]
fn defined_words_execute() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, ": sq dup * ; 7 sq");

    assert_eq!(interpreter.stack()[0].get_int_val(), 49);
}

#[test]
fn definitions_persist_across_sources() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, ": double 2 * ;");
    run(&mut interpreter, "21 double");

    assert_eq!(interpreter.stack()[0].get_int_val(), 42);
}

#[test]
fn compile_time_if_selects_one_branch() {
    let mut interpreter = new_interpreter();

    // The flag is consumed while the source compiles, only the winning branch's code exists
    // afterward.
    interpreter.push(true.to_value());
    run(&mut interpreter, "[if] 1 [else] 2 [then]");

    assert_eq!(interpreter.stack().len(), 1);
    assert_eq!(interpreter.stack()[0].get_int_val(), 1);

    interpreter.clear_stack();

    interpreter.push(false.to_value());
    run(&mut interpreter, "[if] 1 [else] 2 [then]");

    assert_eq!(interpreter.stack()[0].get_int_val(), 2);
}

#[test]
fn compile_time_defined_check_feeds_compile_time_if() {
    let mut interpreter = new_interpreter();

    run(
        &mut interpreter,
        "[defined?] dup [if] 1 [else] 2 [then] [defined?] no-such [if] 10 [else] 20 [then]",
    );

    let stack: Vec<i64> = interpreter.stack().iter().map(|v| v.get_int_val()).collect();
    assert_eq!(stack, vec![1, 20]);
}

#[test]
fn structures_read_and_write() {
    let mut interpreter = new_interpreter();

    run(
        &mut interpreter,
        "# pt x y ; pt.new 3 over pt.x! 4 over pt.y! dup pt.x@ swap pt.y@",
    );

    let stack: Vec<i64> = interpreter.stack().iter().map(|v| v.get_int_val()).collect();
    assert_eq!(stack, vec![3, 4]);
}

#[test]
fn structure_defaults_are_deep_copied_per_instance() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "# config name -> \"default\" , count -> 3 ;");
    run(&mut interpreter, "config.new config.new");

    let second = interpreter.pop_as_structure().unwrap();
    let first = interpreter.pop_as_structure().unwrap();

    assert_eq!(first.locked().fields[0].get_string_val(), "default");
    assert_eq!(first.locked().fields[1].get_int_val(), 3);

    // Changing one instance leaves the other alone.
    first.locked().fields[1] = Value::Int(99);
    assert_eq!(second.locked().fields[1].get_int_val(), 3);
}

#[test]
fn structure_primitives_work_by_index() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "# pair a b ;");
    run(&mut interpreter, "pair.new 42 over 0 #! 0 #@");

    let value = interpreter.pop().unwrap();
    assert_eq!(value.get_int_val(), 42);
}

#[test]
fn structure_field_exists_and_compare() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "# pt x y ;");
    run(&mut interpreter, "\"x\" pt.new #.field-exists?");
    assert!(interpreter.pop().unwrap().get_bool_val());

    run(&mut interpreter, "\"z\" pt.new #.field-exists?");
    assert!(!interpreter.pop().unwrap().get_bool_val());

    run(
        &mut interpreter,
        "pt.new 1 over pt.x! pt.new 1 over pt.x! #.=",
    );
    assert!(interpreter.pop().unwrap().get_bool_val());
}

#[test]
fn structure_iteration_visits_every_field() {
    let mut interpreter = new_interpreter();

    run(
        &mut interpreter,
        "variable total 0 total ! \
         : tally  swap drop total @ + total !  ; \
         # pt x y ; \
         pt.new 10 over pt.x! 32 over pt.y! \
         ` tally swap #.iterate \
         total @",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 42);
}

#[test]
fn caught_errors_push_their_message() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "try \"boom\" throw catch endcatch");

    assert_eq!(interpreter.stack().len(), 1);
    assert_eq!(interpreter.stack()[0].get_string_val(), "boom");
}

#[test]
fn uncaught_errors_unwind_to_the_caller() {
    let mut interpreter = new_interpreter();

    let error = interpreter
        .process_source("<test>", "\"oops\" throw")
        .unwrap_err();

    assert_eq!(error.message(), "oops");
}

#[test]
fn rethrow_outside_catch_propagates() {
    let mut interpreter = new_interpreter();

    // The inner catch handles the first throw, the rethrow afterward escapes the block.
    let result = interpreter.process_source(
        "<test>",
        "try \"first\" throw catch endcatch \"second\" throw",
    );

    assert_eq!(result.unwrap_err().message(), "second");
}

#[test]
fn catch_protects_runtime_errors_from_words() {
    let mut interpreter = new_interpreter();

    // A stack underflow raised by a word lands in the catch like any thrown error.
    run(&mut interpreter, "clearstack try drop catch endcatch depth");

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 1);
}

#[test]
fn nested_loops_break_only_the_innermost() {
    let mut interpreter = new_interpreter();

    // The outer loop counts to three, the inner loop breaks immediately on every pass.
    run(
        &mut interpreter,
        "0 begin \
            begin true if break then false until \
            1 + dup 3 >= \
         until",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 3);
}

#[test]
fn dictionary_scopes_restore_older_bindings() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, ": probe 1 ;");
    run(&mut interpreter, "probe");
    assert_eq!(interpreter.pop().unwrap().get_int_val(), 1);

    interpreter.mark_context();

    run(&mut interpreter, ": probe 2 ;");
    run(&mut interpreter, "probe");
    assert_eq!(interpreter.pop().unwrap().get_int_val(), 2);

    interpreter.release_context();

    run(&mut interpreter, "probe");
    assert_eq!(interpreter.pop().unwrap().get_int_val(), 1);
}

#[test]
fn word_locals_vanish_after_the_word_returns() {
    let mut interpreter = new_interpreter();

    run(
        &mut interpreter,
        ": keeper variable local 5 local ! local @ ;",
    );
    run(&mut interpreter, "keeper");

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 5);

    // The local's name is gone along with the word's context.
    assert!(interpreter.process_source("<test>", "local").is_err());
}

#[test]
fn multi_line_strings_trim_to_their_margin() {
    let mut interpreter = new_interpreter();

    let source = "\"*\n    first line\n    second line\n*\"";

    run(&mut interpreter, source);

    assert_eq!(
        interpreter.pop().unwrap().get_string_val(),
        "first line\nsecond line\n"
    );
}

#[test]
fn string_escapes_translate() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "\"a\\tb\\n\\065\"");

    assert_eq!(interpreter.pop().unwrap().get_string_val(), "a\tb\nA");
}

#[test]
fn unterminated_strings_fail_to_tokenize() {
    let mut interpreter = new_interpreter();

    assert!(interpreter.process_source("<test>", "\"unclosed").is_err());
    assert!(interpreter.process_source("<test>", "\"line\nbreak\"").is_err());
}

#[test]
fn missing_closing_word_cites_the_search_start() {
    let mut interpreter = new_interpreter();

    let error = interpreter
        .process_source("<test>", "1 if 2")
        .unwrap_err();

    assert!(error.message().contains("then"));
}

#[test]
fn printed_values_parse_back_to_equal_values() {
    let mut interpreter = new_interpreter();

    for value in [Value::Int(42), Value::Int(-7), Value::Bool(true)] {
        let source = value.to_string();

        interpreter.process_source("<test>", &source).unwrap();

        let round_tripped = interpreter.pop().unwrap();
        assert_eq!(round_tripped, value);
    }

    let text = Value::String("a\tstring\nwith escapes".to_string());

    interpreter
        .process_source("<test>", &Value::stringify(&text.get_string_val()))
        .unwrap();

    assert_eq!(interpreter.pop().unwrap(), text);
}

#[test]
fn deep_copies_are_independent_but_equal() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "3 [].new dup value.copy");

    let copy = interpreter.pop_as_array().unwrap();
    let original = interpreter.pop_as_array().unwrap();

    assert_eq!(Value::Array(original.clone()), Value::Array(copy.clone()));

    if let Some(slot) = copy.locked().get_mut(0) {
        *slot = Value::Int(9);
    }

    assert_ne!(Value::Array(original), Value::Array(copy));
}

#[test]
fn equal_values_hash_equally() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();

        value.hash(&mut hasher);
        hasher.finish()
    }

    // Two structurally equal arrays built independently.
    let build = |source: &str| {
        let mut interpreter = new_interpreter();

        interpreter.process_source("<test>", source).unwrap();
        interpreter.pop().unwrap()
    };

    let first = build("2 [].new dup 1 swap 0 swap []! dup 2 swap 1 swap []!");
    let second = build("2 [].new dup 1 swap 0 swap []! dup 2 swap 1 swap []!");

    assert_eq!(first, second);
    assert_eq!(hash_of(&first), hash_of(&second));

    // Numeric coercion keeps mixed representations consistent too.
    assert_eq!(Value::Int(5), Value::Float(5.0));
    assert_eq!(hash_of(&Value::Int(5)), hash_of(&Value::Float(5.0)));
}

#[test]
fn deep_clone_copies_nested_containers() {
    let original = Value::from(vec![1i64, 2, 3]);
    let copy = original.deep_clone();

    assert_eq!(original, copy);

    if let (Value::Array(original), Value::Array(copy)) = (&original, &copy) {
        copy.locked().push_back(Value::Int(4));

        assert_eq!(original.locked().len(), 3);
        assert_eq!(copy.locked().len(), 4);
    } else {
        panic!("Expected arrays.");
    }
}

#[test]
fn arrays_support_the_container_words() {
    let mut interpreter = new_interpreter();

    run(
        &mut interpreter,
        "2 [].new dup 10 swap 0 swap []! dup 20 swap 1 swap []! \
         dup 30 swap [].push_back! \
         dup [].size@",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 3);

    run(&mut interpreter, "dup [].pop_front!");
    assert_eq!(interpreter.pop().unwrap().get_int_val(), 10);
}

#[test]
fn hash_tables_store_and_compare() {
    let mut interpreter = new_interpreter();

    run(
        &mut interpreter,
        "{}.new dup 42 \"answer\" rot {}! dup \"answer\" swap {}@",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 42);

    run(&mut interpreter, "dup \"missing\" swap {}?");
    assert!(!interpreter.pop().unwrap().get_bool_val());

    run(&mut interpreter, "dup {}.size@");
    assert_eq!(interpreter.pop().unwrap().get_int_val(), 1);
}

#[test]
fn code_blocks_move_between_stacks() {
    let mut interpreter = new_interpreter();

    // Build a little code block by hand, pop it to the data stack, push it back and merge it
    // into the surrounding construction.
    run(
        &mut interpreter,
        ": build-five immediate \
           code.new_block \
           5 op.push_constant_value \
           code.pop_stack_block \
           code.push_stack_block \
           code.merge_stack_block ; \
         : gives-five build-five ; \
         gives-five",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 5);
}

#[test]
fn insert_at_front_prepends_instructions() {
    let mut interpreter = new_interpreter();

    // The prologue word injects a push of 1 at the front of the definition that calls it, so
    // the 2 * that follows sees it even though it was written later.
    run(
        &mut interpreter,
        ": prologue immediate \
           true code.insert_at_front \
           1 op.push_constant_value \
           false code.insert_at_front ; \
         : one-doubled 2 * prologue ; \
         one-doubled",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 2);
}

#[test]
fn tick_and_execute_call_words_indirectly() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, ": triple 3 * ; 7 ` triple execute");
    assert_eq!(interpreter.pop().unwrap().get_int_val(), 21);

    run(&mut interpreter, "9 \"triple\" execute");
    assert_eq!(interpreter.pop().unwrap().get_int_val(), 27);
}

#[test]
fn reset_returns_to_the_known_good_state() {
    let mut interpreter = new_interpreter();

    interpreter.mark_context();

    run(&mut interpreter, ": transient 1 ; 10 20");
    assert_eq!(interpreter.stack().len(), 2);

    run(&mut interpreter, "reset");

    assert!(interpreter.stack().is_empty());
    assert!(interpreter.process_source("<test>", "transient").is_err());
}
