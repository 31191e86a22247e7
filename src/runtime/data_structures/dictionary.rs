use crate::{
    lang::source::SourceLocation,
    runtime::data_structures::contextual_list::ContextualData,
};
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

/// When a word runs: immediate words execute in the middle of compilation, normal words have
/// their calls compiled.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordMode {
    Immediate,
    Normal,
}

/// Whether the word's handler is native Rust code or a compiled script body.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordKind {
    Native,
    Scripted,
}

/// Whether the word appears in user facing listings such as `.w`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WordVisibility {
    Visible,
    Hidden,
}

/// Whether the interpreter wraps calls to the word in an automatic scope for its local variables,
/// or the word handles contexts itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordContext {
    Managed,
    Manual,
}

/// Everything the dictionary records about one word.  The actual callable lives in the parallel
/// handler table, referenced here by index.
#[derive(Clone)]
pub struct Word {
    pub name: String,
    pub location: SourceLocation,

    pub mode: WordMode,
    pub kind: WordKind,
    pub visibility: WordVisibility,
    pub context: WordContext,

    pub description: String,
    pub signature: String,

    /// Index into the interpreter's word handler table.  Valid for as long as the scope the
    /// handler was registered in stays alive.
    pub handler_index: usize,
}

impl Word {
    pub fn new(name: String, location: SourceLocation) -> Word {
        Word {
            name,
            location,
            mode: WordMode::Normal,
            kind: WordKind::Native,
            visibility: WordVisibility::Visible,
            context: WordContext::Managed,
            description: String::new(),
            signature: String::new(),
            handler_index: 0,
        }
    }
}

/// One scope's worth of word bindings.
type Scope = HashMap<String, Word>;

/// The word dictionary: a stack of name to Word maps forming the language's lexical scopes.
/// Lookup walks from the innermost scope outward, so a rebinding shadows an outer word until its
/// scope is released and the older binding shows through again.
pub struct Dictionary {
    scopes: Vec<Scope>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Dictionary::new()
    }
}

impl ContextualData for Dictionary {
    fn mark_context(&mut self) {
        self.scopes.push(Scope::new());
    }

    fn release_context(&mut self) {
        if self.scopes.len() <= 1 {
            panic!("Released the base context of the dictionary.");
        }

        let _ = self.scopes.pop();
    }
}

/// The `.w` listing: every visible word with its handler index, immediate marker and
/// description, sorted by name.  Shadowed bindings show only their newest version.
impl Display for Dictionary {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let merged = self.get_merged();

        let visible_count = merged
            .values()
            .filter(|word| word.visibility == WordVisibility::Visible)
            .count();

        let widest = merged.keys().map(|name| name.len()).max().unwrap_or(0);

        writeln!(f, "{} words defined.", visible_count)?;
        writeln!(f)?;

        let mut names: Vec<&String> = merged.keys().collect();
        names.sort();

        for name in names {
            let word = &merged[name];

            if word.visibility == WordVisibility::Hidden {
                continue;
            }

            writeln!(
                f,
                "{:width$}  {:6}{}  --  {}",
                name,
                word.handler_index,
                if word.mode == WordMode::Immediate {
                    "  immediate"
                } else {
                    "           "
                },
                word.description,
                width = widest
            )?;
        }

        Ok(())
    }
}

impl Dictionary {
    /// A new dictionary starts with one base scope that is never released.
    pub fn new() -> Dictionary {
        let mut dictionary = Dictionary { scopes: Vec::new() };

        dictionary.mark_context();
        dictionary
    }

    /// Rebuild a dictionary from a merged scope, used for sub-thread interpreter clones.
    pub fn from_merged(merged: HashMap<String, Word>) -> Dictionary {
        Dictionary {
            scopes: vec![merged],
        }
    }

    /// Bind a word in the innermost scope, overwriting any binding made in that same scope.
    pub fn insert(&mut self, name: String, word: Word) {
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name, word);
        }
    }

    /// Find a word, innermost scope first.
    pub fn find(&self, name: &str) -> Option<&Word> {
        for scope in self.scopes.iter().rev() {
            if let Some(word) = scope.get(name) {
                return Some(word);
            }
        }

        None
    }

    /// Flatten the scope stack into a single map holding each name's newest binding.
    pub fn get_merged(&self) -> HashMap<String, Word> {
        let mut merged = HashMap::new();

        for scope in &self.scopes {
            for (name, word) in scope {
                merged.insert(name.clone(), word.clone());
            }
        }

        merged
    }

    /// Build the inverse lookup: a vector indexed by handler index giving the newest name bound
    /// to that handler.  Used when pretty printing byte-code.
    pub fn inverse_lookup(&self, handler_count: usize) -> Vec<String> {
        let mut names = vec![String::new(); handler_count];

        for scope in &self.scopes {
            for (name, word) in scope {
                if word.handler_index < handler_count {
                    names[word.handler_index] = name.clone();
                }
            }
        }

        names
    }
}
