use crate::{
    lang::source::{SourceBuffer, SourceLocation},
    runtime::{
        error::{self, ScriptError, script_error_str},
        interpreter::Interpreter,
    },
};
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    fs::read_to_string,
    hash::{Hash, Hasher},
};

/// A numeric literal is either a 64-bit integer or a 64-bit float.
#[derive(Clone, Copy)]
pub enum NumberKind {
    Int(i64),
    Float(f64),
}

/// Numbers can end up as hash table keys by way of token values, so Eq and Hash are implemented
/// even though a float payload makes the Eq contract technically unsound.  User documentation
/// warns against float keys.
impl Eq for NumberKind {}

impl PartialEq for NumberKind {
    fn eq(&self, other: &NumberKind) -> bool {
        match (self, other) {
            (NumberKind::Int(a), NumberKind::Int(b)) => a == b,
            (NumberKind::Float(a), NumberKind::Float(b)) => a == b,
            (NumberKind::Int(a), NumberKind::Float(b)) => (*a as f64) == *b,
            (NumberKind::Float(a), NumberKind::Int(b)) => *a == (*b as f64),
        }
    }
}

impl PartialOrd for NumberKind {
    fn partial_cmp(&self, other: &NumberKind) -> Option<Ordering> {
        match (self, other) {
            (NumberKind::Int(a), NumberKind::Int(b)) => a.partial_cmp(b),
            (NumberKind::Float(a), NumberKind::Float(b)) => a.partial_cmp(b),
            (NumberKind::Int(a), NumberKind::Float(b)) => (*a as f64).partial_cmp(b),
            (NumberKind::Float(a), NumberKind::Int(b)) => a.partial_cmp(&(*b as f64)),
        }
    }
}

impl Hash for NumberKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            NumberKind::Int(number) => number.hash(state),
            NumberKind::Float(number) => number.to_bits().hash(state),
        }
    }
}

impl Display for NumberKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NumberKind::Int(number) => write!(f, "{}", number),
            NumberKind::Float(number) => write!(f, "{}", number),
        }
    }
}

impl Debug for NumberKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NumberKind::Int(number) => write!(f, "{}i", number),
            NumberKind::Float(number) => write!(f, "{}f", number),
        }
    }
}

/// The units the tokenizer hands to the compiler.  The language is simple enough that there are
/// only three kinds of token: numbers, string literals and words.  Every token remembers where in
/// the source it came from.
#[derive(Clone, PartialEq, Eq, PartialOrd)]
pub enum Token {
    Number(SourceLocation, NumberKind),
    String(SourceLocation, String),
    Word(SourceLocation, String),
}

/// The token stream produced from one source unit.
pub type TokenList = Vec<Token>;

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Token::Number(location, number) => {
                location.hash(state);
                number.hash(state);
            }

            Token::String(location, text) => {
                location.hash(state);
                text.hash(state);
            }

            Token::Word(location, word) => {
                location.hash(state);
                word.hash(state);
            }
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Number(_, number) => write!(f, "{}", number),
            Token::String(_, text) => write!(f, "{}", text),
            Token::Word(_, word) => write!(f, "{}", word),
        }
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Number(location, number) => write!(f, "{}: {:?}", location, number),
            Token::String(location, text) => write!(f, "{}: {:?}", location, text),
            Token::Word(location, word) => write!(f, "{}: {}", location, word),
        }
    }
}

impl Token {
    /// Where the token was found in the original source.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Token::Number(location, _) => location,
            Token::String(location, _) => location,
            Token::Word(location, _) => location,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Token::Number(_, _))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Token::String(_, _))
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word(_, _))
    }

    /// Get the numeric value, or raise an error for string and word tokens.
    pub fn number(&self, interpreter: &dyn Interpreter) -> error::Result<NumberKind> {
        match self {
            Token::Number(_, number) => Ok(*number),
            _ => script_error_str(interpreter, "Token is not a number."),
        }
    }

    /// Get the textual form of a string or word token.  Number tokens raise an error.
    pub fn text(&self, interpreter: &dyn Interpreter) -> error::Result<&String> {
        match self {
            Token::String(_, text) => Ok(text),
            Token::Word(_, word) => Ok(word),
            _ => script_error_str(interpreter, "Token is not textual."),
        }
    }

    /// Get the text of a string literal token only.
    pub fn string(&self, interpreter: &dyn Interpreter) -> error::Result<&String> {
        match self {
            Token::String(_, text) => Ok(text),
            _ => script_error_str(interpreter, "Token is not a string literal."),
        }
    }

    /// Get the text of a word token only.
    pub fn word(&self, interpreter: &dyn Interpreter) -> error::Result<&String> {
        match self {
            Token::Word(_, word) => Ok(word),
            _ => script_error_str(interpreter, "Token is not a word."),
        }
    }
}

/// The language considers spaces, tabs, and line endings as the only whitespace.
fn is_whitespace(character: char) -> bool {
    character == ' ' || character == '\t' || character == '\r' || character == '\n'
}

fn skip_whitespace(buffer: &mut SourceBuffer) {
    while let Some(next) = buffer.peek_next() {
        if !is_whitespace(next) {
            break;
        }

        let _ = buffer.next_char();
    }
}

/// Translate one escape sequence within a string literal.  The leading \ has already been
/// consumed.  Numeric escapes look like \0 followed by decimal digits and must fit in a byte.
fn process_escape(location: &SourceLocation, buffer: &mut SourceBuffer) -> error::Result<char> {
    match buffer.next_char() {
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),

        Some('0') => {
            let mut digits = String::new();

            while let Some(next) = buffer.peek_next() {
                if !next.is_ascii_digit() {
                    break;
                }

                digits.push(buffer.next_char().unwrap());
            }

            match digits.parse::<u8>() {
                Ok(code) => Ok(code as char),
                Err(_) => ScriptError::new_as_result(
                    Some(location.clone()),
                    format!("Character literal '{}' is out of range.", digits),
                    None,
                ),
            }
        }

        // Unrecognized escapes pass the character through untranslated.
        Some(other) => Ok(other),

        None => ScriptError::new_as_result(
            Some(location.clone()),
            "Unexpected end of source within string literal.".to_string(),
            None,
        ),
    }
}

/// Extract the body of a multi-line string literal.  The opening " has been consumed and the *
/// is next in the buffer.
///
/// The column of the first non-whitespace character after the opening "* becomes the left margin.
/// At each new line leading whitespace is dropped up to, but never past, that margin so scripts
/// can indent their literals to match the surrounding code.  Entirely blank lines are preserved
/// as newlines.
fn process_multi_line_string(
    location: &SourceLocation,
    buffer: &mut SourceBuffer,
) -> error::Result<String> {
    fn unexpected_end<T>(location: &SourceLocation) -> error::Result<T> {
        ScriptError::new_as_result(
            Some(location.clone()),
            "Unexpected end of source within string literal.".to_string(),
            None,
        )
    }

    let star = buffer.next_char();
    debug_assert!(star == Some('*'));

    skip_whitespace(buffer);

    let margin = buffer.location().column();
    let mut text = String::new();

    loop {
        let next = match buffer.next_char() {
            Some(next) => next,
            None => return unexpected_end(location),
        };

        match next {
            '*' => match buffer.peek_next() {
                // Closing *" pair, the literal is complete.
                Some('"') => {
                    let _ = buffer.next_char();
                    break;
                }

                // A lone * is just part of the text.
                Some(_) => text.push('*'),
                None => return unexpected_end(location),
            },

            '\\' => text.push(process_escape(location, buffer)?),

            '\n' => {
                text.push('\n');

                // Eat the indentation of the following line, stopping at the margin.  Count any
                // completely blank lines that get skipped so they stay in the text.
                let start_line = buffer.location().line();

                loop {
                    match buffer.peek_next() {
                        Some(next) if is_whitespace(next) => {
                            if buffer.location().column() >= margin {
                                break;
                            }

                            let _ = buffer.next_char();
                        }

                        Some(_) => break,
                        None => return unexpected_end(location),
                    }
                }

                for _ in start_line..buffer.location().line() {
                    text.push('\n');
                }
            }

            _ => text.push(next),
        }
    }

    Ok(text)
}

/// Extract a string literal.  Either the single line form, which can not contain raw newlines, or
/// the multi-line "* ... *" form.
fn process_string(buffer: &mut SourceBuffer) -> error::Result<(SourceLocation, String)> {
    let quote = buffer.next_char();
    let location = buffer.location().clone();

    debug_assert!(quote == Some('"'));

    if buffer.peek_next() == Some('*') {
        let text = process_multi_line_string(&location, buffer)?;
        return Ok((location, text));
    }

    let mut text = String::new();

    loop {
        match buffer.peek_next() {
            Some('"') => {
                let _ = buffer.next_char();
                break;
            }

            Some('\n') => {
                return ScriptError::new_as_result(
                    Some(location.clone()),
                    "Unexpected new line within string literal.".to_string(),
                    None,
                );
            }

            Some('\\') => {
                let _ = buffer.next_char();
                text.push(process_escape(&location, buffer)?);
            }

            Some(_) => text.push(buffer.next_char().unwrap()),

            None => {
                return ScriptError::new_as_result(
                    Some(location.clone()),
                    "Unexpected end of source within string literal.".to_string(),
                    None,
                );
            }
        }
    }

    Ok((location, text))
}

/// Gather a run of non-whitespace characters.  Anything goes in a word name.
fn process_word_text(buffer: &mut SourceBuffer) -> (SourceLocation, String) {
    let location = buffer.location().clone();
    let mut text = String::new();

    while let Some(next) = buffer.peek_next() {
        if is_whitespace(next) {
            break;
        }

        text.push(buffer.next_char().unwrap());
    }

    (location, text)
}

/// Quick test for text that could be a numeric literal.  A definitive answer comes from actually
/// parsing it in to_number.
fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();

    match chars.next() {
        Some('-') | Some('+') => matches!(chars.next(), Some(digit) if digit.is_ascii_digit()),
        Some(digit) => digit.is_ascii_digit(),
        None => false,
    }
}

/// Parse a numeric literal.  Supported forms are 0x hex integers, 0b binary integers, floats,
/// (any literal containing a '.',) and decimal integers.  Underscores are allowed as digit
/// separators.
pub fn to_number(text: &str) -> Option<NumberKind> {
    let cleaned = text.replace('_', "");

    if let Some(hex) = cleaned.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(NumberKind::Int);
    }

    if let Some(binary) = cleaned.strip_prefix("0b") {
        return i64::from_str_radix(binary, 2).ok().map(NumberKind::Int);
    }

    if cleaned.contains('.') {
        return cleaned.parse().ok().map(NumberKind::Float);
    }

    cleaned.parse().ok().map(NumberKind::Int)
}

/// Break a source string into a token list.  Tokenizing is a pure function of the text, no
/// interpreter state is involved.
pub fn tokenize_source(path: &str, source: &str) -> error::Result<TokenList> {
    let mut buffer = SourceBuffer::new(path, source);
    let mut tokens = TokenList::new();

    while let Some(next) = buffer.peek_next() {
        if is_whitespace(next) {
            skip_whitespace(&mut buffer);
            continue;
        }

        if next == '"' {
            let (location, text) = process_string(&mut buffer)?;
            tokens.push(Token::String(location, text));
            continue;
        }

        let (location, text) = process_word_text(&mut buffer);

        // Retype the word as a number when it parses as one.
        let token = if looks_numeric(&text) {
            match to_number(&text) {
                Some(number) => Token::Number(location, number),
                None => Token::Word(location, text),
            }
        } else {
            Token::Word(location, text)
        };

        tokens.push(token);
    }

    Ok(tokens)
}

/// Load a file and tokenize its contents.
pub fn tokenize_file(path: &str) -> error::Result<TokenList> {
    match read_to_string(path) {
        Ok(source) => tokenize_source(path, &source),
        Err(error) => ScriptError::new_as_result(
            None,
            format!("Could not read source file {}: {}", path, error),
            None,
        ),
    }
}
