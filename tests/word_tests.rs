// Parameterized coverage of the core stack, math, logic and comparison words.

use sorth::runtime::built_ins::register_built_in_words;
use sorth::runtime::data_structures::value::Value;
use sorth::runtime::error::Result;
use sorth::runtime::interpreter::strange_interpreter::StrangeInterpreter;
use sorth::runtime::interpreter::{CodeManagement, InterpreterStack};
use test_case::test_case;

/// Run a snippet against a pre-seeded stack and return the resulting stack as integers, bottom
/// first.  Booleans read back as 1 and 0.
fn eval_and_stack(source: &str, init_stack: &[i64]) -> Result<Vec<i64>> {
    let mut interpreter = StrangeInterpreter::new();

    register_built_in_words(&mut interpreter);

    for &value in init_stack {
        interpreter.push(Value::Int(value));
    }

    interpreter.process_source("<test>", source)?;

    Ok(interpreter
        .stack()
        .iter()
        .map(|value| value.get_int_val())
        .collect())
}

#[test_case("0", &[], &[0]; "zero")]
#[test_case("42", &[], &[42]; "number")]
#[test_case("-17", &[], &[-17]; "negative number")]
#[test_case("0x2a", &[], &[42]; "hex number")]
#[test_case("0b101010", &[], &[42]; "binary number")]
#[test_case("1_000", &[], &[1000]; "separated number")]
#[test_case("true", &[], &[1]; "true word")]
#[test_case("false", &[], &[0]; "false word")]
#[test_case("+", &[2, 3], &[5]; "add")]
#[test_case("-", &[5, 2], &[3]; "subtract")]
#[test_case("*", &[3, 4], &[12]; "multiply")]
#[test_case("/", &[12, 3], &[4]; "divide")]
#[test_case("%", &[13, 5], &[3]; "modulo")]
#[test_case("&", &[6, 3], &[2]; "bit and")]
#[test_case("|", &[6, 3], &[7]; "bit or")]
#[test_case("^", &[6, 3], &[5]; "bit xor")]
#[test_case("~", &[0], &[-1]; "bit complement")]
#[test_case("<<", &[1, 4], &[16]; "shift left")]
#[test_case(">>", &[16, 4], &[1]; "shift right")]
#[test_case("=", &[5, 5], &[1]; "equal")]
#[test_case("=", &[5, 6], &[0]; "equal when different")]
#[test_case("<>", &[5, 6], &[1]; "not equal")]
#[test_case("<", &[3, 4], &[1]; "less than")]
#[test_case("<", &[4, 3], &[0]; "less than when greater")]
#[test_case(">", &[4, 3], &[1]; "greater than")]
#[test_case("<=", &[3, 3], &[1]; "less or equal")]
#[test_case(">=", &[2, 3], &[0]; "greater or equal when less")]
#[test_case("true false &&", &[], &[0]; "logical and")]
#[test_case("true false ||", &[], &[1]; "logical or")]
#[test_case("true '", &[], &[0]; "logical not")]
#[test_case("dup", &[42], &[42, 42]; "dup")]
#[test_case("drop", &[1, 2], &[1]; "drop")]
#[test_case("swap", &[1, 2], &[2, 1]; "swap")]
#[test_case("over", &[1, 2], &[1, 2, 1]; "over")]
#[test_case("rot", &[1, 2, 3], &[2, 3, 1]; "rot")]
#[test_case("1 pick", &[1, 2, 3], &[1, 3, 2]; "pick")]
#[test_case("2 push-to", &[1, 2, 3], &[3, 1, 2]; "push to")]
#[test_case("depth", &[1, 2, 3], &[1, 2, 3, 3]; "depth")]
#[test_case("clearstack", &[1, 2, 3], &[]; "clearstack")]
#[test_case("1 if 42 then", &[], &[42]; "if taken")]
#[test_case("0 if 42 then", &[], &[]; "if not taken")]
#[test_case("1 if 1 else 2 then", &[], &[1]; "if else true")]
#[test_case("0 if 1 else 2 then", &[], &[2]; "if else false")]
#[test_case(": sq dup * ; 7 sq", &[], &[49]; "word definition")]
#[test_case("variable x 42 x ! x @", &[], &[42]; "variable round trip")]
#[test_case("42 constant answer answer", &[], &[42]; "constant")]
fn eval_gives_expected_stack(source: &str, init_stack: &[i64], expected: &[i64]) {
    let result = eval_and_stack(source, init_stack).unwrap();
    assert_eq!(result, expected);
}

#[test_case("0 begin 1 + dup 5 >= until", &[], &[5]; "until loop")]
#[test_case(
    "0 10 begin dup 0 > while swap over + swap 1 - repeat drop",
    &[],
    &[55];
    "while loop sums"
)]
#[test_case(
    "0 begin 1 + dup 3 >= if break then continue until",
    &[],
    &[3];
    "break leaves the loop"
)]
fn loops_give_expected_stack(source: &str, init_stack: &[i64], expected: &[i64]) {
    let result = eval_and_stack(source, init_stack).unwrap();
    assert_eq!(result, expected);
}

#[test]
fn float_arithmetic_promotes() {
    let mut interpreter = StrangeInterpreter::new();

    register_built_in_words(&mut interpreter);
    interpreter.process_source("<test>", "1 2.5 +").unwrap();

    assert_eq!(interpreter.stack().len(), 1);
    assert!((interpreter.stack()[0].get_float_val() - 3.5).abs() < f64::EPSILON);
}

#[test]
fn string_concatenation() {
    let mut interpreter = StrangeInterpreter::new();

    register_built_in_words(&mut interpreter);
    interpreter
        .process_source("<test>", "\"fizz\" \"buzz\" +")
        .unwrap();

    assert_eq!(interpreter.stack()[0].get_string_val(), "fizzbuzz");
}

#[test]
fn underflow_reports_an_error() {
    assert!(eval_and_stack("+", &[]).is_err());
    assert!(eval_and_stack("+", &[1]).is_err());
    assert!(eval_and_stack("drop", &[]).is_err());
}

#[test]
fn division_by_zero_reports_an_error() {
    assert!(eval_and_stack("/", &[1, 0]).is_err());
    assert!(eval_and_stack("%", &[1, 0]).is_err());
}

#[test]
fn unknown_word_reports_an_error() {
    let error = eval_and_stack("no-such-word", &[]).unwrap_err();
    assert!(error.message().contains("no-such-word"));
}
