use std::{
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    str::Chars,
};

/// A position within a piece of source code.  Locations are recorded in tokens and byte-code
/// instructions so that run-time errors can point back at the line of script that caused them.
///
/// The path can be a real file path or a descriptive tag, for example code typed into the repl is
/// tagged as "<repl>".
#[derive(Clone, PartialEq, Eq, PartialOrd, Debug)]
pub struct SourceLocation {
    path: String,

    /// 1 based line number.
    line: usize,

    /// 1 based column number.
    column: usize,
}

impl Hash for SourceLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.line.hash(state);
        self.column.hash(state);
    }
}

/// Locations print as path:line:column, the same shape used by error messages.
impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation::new()
    }
}

impl SourceLocation {
    /// Create a location that doesn't refer to any real source.
    pub fn new() -> SourceLocation {
        SourceLocation {
            path: "unknown".to_string(),
            line: 1,
            column: 1,
        }
    }

    /// Create a location at the very start of the given source path.
    pub fn at_start_of(path: &str) -> SourceLocation {
        SourceLocation {
            path: path.to_string(),
            line: 1,
            column: 1,
        }
    }

    /// Create a fully specified location.  Useful with the location_here! macro for words that are
    /// registered from Rust code.
    pub fn from_parts(path: &str, line: usize, column: usize) -> SourceLocation {
        SourceLocation {
            path: path.to_string(),
            line,
            column,
        }
    }

    pub fn path(&self) -> &String {
        &self.path
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

/// Capture the location of the macro invocation itself.  Used when native code executes or
/// registers words and needs a location to report.
#[macro_export]
macro_rules! location_here {
    () => {
        $crate::lang::source::SourceLocation::from_parts(
            file!(),
            line!() as usize,
            column!() as usize,
        )
    };
}

/// A forward only cursor over a piece of source code that tracks the line and column of the read
/// position.  The tokenizer drives one of these to pull characters while keeping locations
/// accurate for diagnostics.
///
/// The buffer borrows the source text, it is not copied.
pub struct SourceBuffer<'a> {
    chars: Chars<'a>,

    /// One character of look-ahead, filled on demand by peek_next.
    pending: Option<char>,

    location: SourceLocation,
}

impl<'a> SourceBuffer<'a> {
    pub fn new(path: &str, source: &'a str) -> SourceBuffer<'a> {
        SourceBuffer {
            chars: source.chars(),
            pending: None,
            location: SourceLocation::at_start_of(path),
        }
    }

    /// Where the read cursor currently is within the source.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Look at the next character without consuming it.
    pub fn peek_next(&mut self) -> Option<char> {
        if self.pending.is_none() {
            self.pending = self.chars.next();
        }

        self.pending
    }

    /// Consume and return the next character, updating the tracked location.
    pub fn next_char(&mut self) -> Option<char> {
        let next = match self.pending.take() {
            Some(next) => Some(next),
            None => self.chars.next(),
        };

        if let Some(character) = next {
            if character == '\n' {
                self.location.line += 1;
                self.location.column = 1;
            } else {
                self.location.column += 1;
            }
        }

        next
    }
}
