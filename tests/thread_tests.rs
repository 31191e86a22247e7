// Coverage of the sub-thread model: spawning, the blocking queues, and thread reaping.

use sorth::runtime::built_ins::register_built_in_words;
use sorth::runtime::interpreter::strange_interpreter::StrangeInterpreter;
use sorth::runtime::interpreter::{CodeManagement, InterpreterStack, ThreadManagement};

fn new_interpreter() -> StrangeInterpreter {
    let mut interpreter = StrangeInterpreter::new();

    register_built_in_words(&mut interpreter);
    interpreter
}

fn run(interpreter: &mut StrangeInterpreter, source: &str) {
    interpreter.process_source("<test>", source).unwrap();
}

#[test]
fn a_sub_thread_echoes_through_its_queues() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, ": doubler thread.pop 2 * thread.push ;");
    run(
        &mut interpreter,
        "` doubler thread.new 5 over thread.push-to thread.pop-from",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 10);
}

#[test]
fn queue_values_arrive_in_push_order() {
    let mut interpreter = new_interpreter();

    // The relay copies five inputs to its output queue one at a time.
    run(
        &mut interpreter,
        ": relay 0 begin thread.pop thread.push 1 + dup 5 >= until drop ;",
    );

    run(&mut interpreter, "` relay thread.new");

    let id_value = interpreter.pop().unwrap();

    for value in 1..=5 {
        interpreter.push(sorth::runtime::data_structures::value::Value::Int(value));
        interpreter.push(id_value.clone());
        run(&mut interpreter, "thread.push-to");
    }

    let mut received = Vec::new();

    for _ in 0..5 {
        interpreter.push(id_value.clone());
        run(&mut interpreter, "thread.pop-from");
        received.push(interpreter.pop().unwrap().get_int_val());
    }

    assert_eq!(received, vec![1, 2, 3, 4, 5]);
}

#[test]
fn values_survive_a_finished_producer() {
    let mut interpreter = new_interpreter();

    // The producer pushes all of its outputs and exits immediately.  Everything it pushed must
    // still be observable afterward, the thread entry lives until its outputs are drained.
    run(&mut interpreter, ": producer 1 thread.push 2 thread.push 3 thread.push ;");
    run(&mut interpreter, "` producer thread.new");

    let id_value = interpreter.pop().unwrap();

    // Give the producer time to finish before draining.
    std::thread::sleep(std::time::Duration::from_millis(100));

    let mut received = Vec::new();

    for _ in 0..3 {
        interpreter.push(id_value.clone());
        run(&mut interpreter, "thread.pop-from");
        received.push(interpreter.pop().unwrap().get_int_val());
    }

    assert_eq!(received, vec![1, 2, 3]);
}

#[test]
fn drained_threads_are_reaped() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, ": one-shot 42 thread.push ;");
    run(&mut interpreter, "` one-shot thread.new dup thread.pop-from");

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 42);

    // The entry disappears once the thread has finished and its outputs are gone.  Finishing
    // happens on the child's schedule, so poll briefly.
    let id_value = interpreter.pop().unwrap();
    let mut reaped = false;

    for _ in 0..50 {
        if interpreter.sub_threads().is_empty() {
            reaped = true;
            break;
        }

        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    assert!(reaped, "The finished thread was never reaped.");

    // Addressing the reaped thread is an error.
    interpreter.push(id_value);
    assert!(interpreter.process_source("<test>", "thread.pop-from").is_err());
}

#[test]
fn unknown_thread_ids_report_errors() {
    let mut interpreter = new_interpreter();

    // The root interpreter has no queues of its own.
    let error = interpreter.process_source("<test>", "thread.pop").unwrap_err();
    assert!(error.message().contains("input queue"));

    // And an id that was never allocated is rejected.
    interpreter.push(sorth::runtime::data_structures::value::Value::ThreadId(9999));

    let error = interpreter
        .process_source("<test>", "5 swap thread.push-to")
        .unwrap_err();

    assert!(error.message().contains("thread id"));
}

#[test]
fn sub_threads_see_the_parents_definitions() {
    let mut interpreter = new_interpreter();

    run(&mut interpreter, "10 constant base : shifted thread.pop base + thread.push ;");
    run(
        &mut interpreter,
        "` shifted thread.new 32 over thread.push-to thread.pop-from",
    );

    assert_eq!(interpreter.pop().unwrap().get_int_val(), 42);
}
