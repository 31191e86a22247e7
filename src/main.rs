use sorth::{
    add_native_word, location_here,
    runtime::{
        built_ins::register_built_in_words,
        data_structures::{contextual_list::ContextualData, value::Value},
        error,
        interpreter::{
            strange_interpreter::StrangeInterpreter, CodeManagement, Interpreter,
            InterpreterStack, WordManagement,
        },
    },
};
use std::{
    env::{args, current_exe, var},
    io::{self, Write},
    process::exit,
};

/// The directory searched for library scripts.  The SORTH_LIB_PATH environment variable wins,
/// otherwise the directory holding the executable is used.
fn library_directory() -> Option<String> {
    if let Ok(path) = var("SORTH_LIB_PATH") {
        return Some(path);
    }

    current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_string_lossy().to_string()))
}

/// The interactive prompt.  Lines are compiled and run one at a time, errors print with their
/// call stacks and clear the data stack, and the session continues until quit or end of input.
fn run_repl(interpreter: &mut StrangeInterpreter) {
    println!("Strange Forth {}.", env!("CARGO_PKG_VERSION"));
    println!("Type quit to leave.");

    let stdin = io::stdin();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();

        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        match interpreter.process_source("<repl>", &line) {
            Ok(()) => {
                println!("ok");
            }

            Err(error) => {
                eprintln!("{}", error);

                interpreter.clear_stack();
                interpreter.clear_halt_flag();
            }
        }

        if interpreter.is_halted() {
            break;
        }
    }
}

fn run(interpreter: &mut StrangeInterpreter) -> error::Result<()> {
    if let Some(directory) = library_directory() {
        // A missing library directory isn't fatal, scripts simply won't find library includes.
        let _ = interpreter.add_search_path(&directory);
    }

    register_built_in_words(interpreter);

    // Everything registered so far forms the interpreter's known good state, the reset word
    // rolls back to it.
    interpreter.mark_context();

    let arguments: Vec<String> = args().collect();

    if arguments.len() >= 2 {
        // Hand the script its own arguments through the sorth.args word.
        let script_arguments = Value::from(&arguments[2..].to_vec());

        let handler = move |interpreter: &mut dyn Interpreter| -> error::Result<()> {
            interpreter.push(script_arguments.clone());
            Ok(())
        };

        add_native_word!(
            interpreter,
            "sorth.args",
            handler,
            "The command line arguments passed to the script.",
            " -- argument-list"
        );

        let script_path = interpreter.find_file(&arguments[1])?;

        interpreter.process_source_file(&script_path)?;
    } else if interpreter.find_word("repl").is_some() {
        // A library can provide its own repl word, use it when present.
        interpreter.execute_word_named(&location_here!(), "repl")?;
    } else {
        run_repl(interpreter);
    }

    Ok(())
}

fn main() {
    let mut interpreter = StrangeInterpreter::new();

    if let Err(error) = run(&mut interpreter) {
        eprintln!("{}", error);
        exit(1);
    }

    exit(interpreter.exit_code() as i32);
}
