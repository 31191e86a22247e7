// Coverage of the byte buffer container: integer, float and string round trips, cursor
// handling, bounds checks, and sub-buffer views.

use sorth::runtime::built_ins::register_built_in_words;
use sorth::runtime::data_structures::byte_buffer::{ByteBuffer, SubBuffer};
use sorth::runtime::data_structures::SharedLock;
use sorth::runtime::interpreter::strange_interpreter::StrangeInterpreter;
use sorth::runtime::interpreter::{CodeManagement, InterpreterStack};
use test_case::test_case;

fn new_interpreter() -> StrangeInterpreter {
    let mut interpreter = StrangeInterpreter::new();

    register_built_in_words(&mut interpreter);
    interpreter
}

#[test_case(1, 0x7f; "one byte positive")]
#[test_case(1, -0x80; "one byte negative")]
#[test_case(2, 0x7fff; "two bytes positive")]
#[test_case(2, -0x8000; "two bytes negative")]
#[test_case(4, 0x7fff_ffff; "four bytes positive")]
#[test_case(4, -0x8000_0000; "four bytes negative")]
#[test_case(8, i64::MAX; "eight bytes positive")]
#[test_case(8, i64::MIN; "eight bytes negative")]
fn signed_integers_round_trip(byte_size: usize, value: i64) {
    let mut buffer = ByteBuffer::new(16);

    buffer.write_int(byte_size, value).unwrap();

    buffer.set_position(0).unwrap();
    assert_eq!(buffer.read_int(byte_size, true).unwrap(), value);
}

#[test_case(1, 0xff; "one byte")]
#[test_case(2, 0xffff; "two bytes")]
#[test_case(4, 0xffff_ffff; "four bytes")]
fn unsigned_reads_keep_the_bit_pattern(byte_size: usize, value: i64) {
    let mut buffer = ByteBuffer::new(16);

    buffer.write_int(byte_size, -1).unwrap();

    buffer.set_position(0).unwrap();
    assert_eq!(buffer.read_int(byte_size, false).unwrap(), value);
}

#[test]
fn floats_round_trip() {
    let mut buffer = ByteBuffer::new(16);

    buffer.write_float(8, 1234.5678).unwrap();
    buffer.write_float(4, 0.5).unwrap();

    buffer.set_position(0).unwrap();

    assert!((buffer.read_float(8).unwrap() - 1234.5678).abs() < f64::EPSILON);
    assert!((buffer.read_float(4).unwrap() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn strings_truncate_and_pad() {
    let mut buffer = ByteBuffer::new(8);

    buffer.write_string(8, "hi").unwrap();
    buffer.set_position(0).unwrap();

    assert_eq!(buffer.read_string(8).unwrap(), "hi");

    buffer.set_position(0).unwrap();
    buffer.write_string(4, "overflowing").unwrap();
    buffer.set_position(0).unwrap();

    assert_eq!(buffer.read_string(4).unwrap(), "over");
}

#[test]
fn out_of_bounds_accesses_fail() {
    let mut buffer = ByteBuffer::new(4);

    assert!(buffer.write_int(8, 1).is_err());
    assert!(buffer.set_position(5).is_err());

    buffer.set_position(2).unwrap();
    assert!(buffer.read_int(4, true).is_err());
}

#[test]
fn invalid_widths_fail() {
    let mut buffer = ByteBuffer::new(16);

    assert!(buffer.write_int(3, 1).is_err());
    assert!(buffer.read_int(5, true).is_err());
    assert!(buffer.write_float(2, 1.0).is_err());
}

#[test]
fn sub_buffers_window_their_parent() {
    let parent = ByteBuffer::new_ptr(16);

    parent.locked().set_position(4).unwrap();

    let mut view = SubBuffer::new(parent.clone());

    view.write_int(2, 0x1234).unwrap();

    // The view's writes land at its base offset within the parent, and advancing the view drags
    // the parent's cursor along.
    assert_eq!(parent.locked().position(), 6);

    view.set_position(0).unwrap();
    assert_eq!(view.read_int(2, false).unwrap(), 0x1234);

    let mut direct = parent.locked();

    direct.set_position(4).unwrap();
    assert_eq!(direct.read_int(2, false).unwrap(), 0x1234);
}

#[test]
fn buffer_words_round_trip() {
    let mut interpreter = new_interpreter();

    interpreter
        .process_source(
            "<test>",
            "16 buffer.new \
             dup -2 over 2 buffer.int! \
             dup 0 swap buffer.position! \
             dup 2 true buffer.int@",
        )
        .unwrap();

    assert_eq!(interpreter.pop().unwrap().get_int_val(), -2);

    // The same bytes read back unsigned show the raw bit pattern.
    interpreter
        .process_source("<test>", "dup 0 swap buffer.position! dup 2 false buffer.int@")
        .unwrap();

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 0xfffe);
}

#[test]
fn buffer_position_word_reports_the_cursor() {
    let mut interpreter = new_interpreter();

    interpreter
        .process_source(
            "<test>",
            "8 buffer.new dup 7 over 4 buffer.int! buffer.position@",
        )
        .unwrap();

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 4);
}

#[test]
fn buffer_string_words_round_trip() {
    let mut interpreter = new_interpreter();

    interpreter
        .process_source(
            "<test>",
            "16 buffer.new \
             dup \"hello\" over 8 buffer.string! \
             dup 0 swap buffer.position! \
             dup 8 buffer.string@",
        )
        .unwrap();

    assert_eq!(interpreter.pop().unwrap().get_string_val(), "hello");
}
