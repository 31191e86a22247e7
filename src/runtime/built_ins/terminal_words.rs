use crate::{
    add_native_word,
    runtime::{
        data_structures::value::ToValue,
        error::{self, script_error_str},
        interpreter::Interpreter,
    },
};
use std::io::Write;

/// Write the top value to the terminal with no added spacing.
///
/// Signature: `value -- `
fn word_term_write(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    print!("{}", value);
    Ok(())
}

/// Flush any buffered terminal output.
fn word_term_flush(_interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = std::io::stdout().flush();
    Ok(())
}

/// Read one line of text from the terminal, without the line ending.
///
/// Signature: ` -- line`
fn word_term_read_line(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let mut line = String::new();

    if std::io::stdin().read_line(&mut line)? == 0 {
        return script_error_str(interpreter, "End of input reached.");
    }

    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    interpreter.push(line.to_value());
    Ok(())
}

/// Is the single character string printable text?
///
/// Signature: `character -- flag`
fn word_term_is_printable(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let text = interpreter.pop_as_string()?;

    let printable = match text.chars().next() {
        Some(character) => !character.is_control(),
        None => false,
    };

    interpreter.push(printable.to_value());
    Ok(())
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::{
        io::Read,
        mem::MaybeUninit,
        sync::Mutex,
    };

    // The terminal settings in effect before raw mode was switched on, kept so it can be
    // switched back off.
    static SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);

    /// Switch the terminal's raw mode on or off.  In raw mode keys arrive unbuffered and without
    /// echo, which is what an interactive line editor wants.
    ///
    /// Signature: `flag -- `
    pub fn word_term_raw_mode(interpreter: &mut dyn Interpreter) -> error::Result<()> {
        let enable = interpreter.pop_as_bool()?;
        let mut saved = SAVED_TERMIOS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        unsafe {
            if enable {
                if saved.is_none() {
                    let mut termios = MaybeUninit::<libc::termios>::uninit();

                    if libc::tcgetattr(libc::STDIN_FILENO, termios.as_mut_ptr()) != 0 {
                        return script_error_str(
                            interpreter,
                            "Could not read the terminal settings.",
                        );
                    }

                    let original = termios.assume_init();
                    let mut raw = original;

                    libc::cfmakeraw(&mut raw);

                    if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw) != 0 {
                        return script_error_str(
                            interpreter,
                            "Could not change the terminal settings.",
                        );
                    }

                    *saved = Some(original);
                }
            } else if let Some(original) = saved.take() {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &original) != 0 {
                    return script_error_str(
                        interpreter,
                        "Could not restore the terminal settings.",
                    );
                }
            }
        }

        Ok(())
    }

    /// The terminal's size in characters.
    ///
    /// Signature: ` -- width height`
    pub fn word_term_size(interpreter: &mut dyn Interpreter) -> error::Result<()> {
        let mut size = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };

        let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut size) };

        if result != 0 {
            return script_error_str(interpreter, "Could not read the terminal size.");
        }

        interpreter.push((size.ws_col as i64).to_value());
        interpreter.push((size.ws_row as i64).to_value());

        Ok(())
    }

    /// Read a single key from the terminal as a one character string.
    ///
    /// Signature: ` -- key`
    pub fn word_term_key(interpreter: &mut dyn Interpreter) -> error::Result<()> {
        let mut byte = [0u8; 1];

        if std::io::stdin().read(&mut byte)? == 0 {
            return script_error_str(interpreter, "End of input reached.");
        }

        interpreter.push((byte[0] as char).to_string().to_value());
        Ok(())
    }
}

pub fn register_terminal_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "term.!",
        word_term_write,
        "Write a value to the terminal without spacing.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "term.flush",
        word_term_flush,
        "Flush buffered terminal output.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "term.readline",
        word_term_read_line,
        "Read one line of text from the terminal.",
        " -- line"
    );

    add_native_word!(
        interpreter,
        "term.is_printable?",
        word_term_is_printable,
        "Is the given character printable?",
        "character -- flag"
    );

    #[cfg(unix)]
    {
        add_native_word!(
            interpreter,
            "term.raw_mode",
            unix::word_term_raw_mode,
            "Switch the terminal's raw mode on or off.",
            "flag -- "
        );

        add_native_word!(
            interpreter,
            "term.size@",
            unix::word_term_size,
            "The terminal's size in characters.",
            " -- width height"
        );

        add_native_word!(
            interpreter,
            "term.key",
            unix::word_term_key,
            "Read a single key from the terminal.",
            " -- key"
        );
    }
}
