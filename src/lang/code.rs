use crate::{
    lang::source::SourceLocation,
    runtime::data_structures::value::Value,
};
use std::{
    cmp::Ordering,
    collections::VecDeque,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

/// The operation set of the Strange Forth virtual machine.
///
/// Jump style operations, (Jump, JumpIfZero, JumpIfNotZero, MarkLoopExit, and MarkCatch,) carry a
/// label name string while a construction is being built.  A jump resolution pass rewrites these
/// labels into relative instruction offsets before the code is run.
#[derive(Clone, Eq, Debug)]
pub enum Op {
    /// Allocate a new variable slot and define a word, named by the value, that pushes the slot's
    /// index.
    DefVariable(Value),

    /// Pop a value from the stack and define a word, named by the value, that pushes a copy of it.
    DefConstant(Value),

    /// Pop a variable index and push that variable's value.
    ReadVariable,

    /// Pop a variable index, then pop a value and store it in that variable.
    WriteVariable,

    /// Call a word.  The value is either the word's name, resolved when the instruction runs, or
    /// a handler table index resolved at compile time.
    Execute(Value),

    /// Look up the named word and push its handler table index.
    WordIndex(Value),

    /// Push whether the named word is currently defined.
    WordExists(Value),

    /// Push a deep copy of the carried constant.  The copy keeps user code from mutating the
    /// constant through a shared container reference.
    PushConstantValue(Value),

    /// Open a loop scope.  The next instruction is the loop's start and the resolved offset gives
    /// the loop's exit.
    MarkLoopExit(Value),

    /// Close the innermost loop scope.
    UnmarkLoopExit,

    /// Arm a catch handler at the resolved offset.  A script error raised while the catch is
    /// armed lands there with the error message on the stack.
    MarkCatch(Value),

    /// Disarm the innermost catch handler.
    UnmarkCatch,

    /// Mark a new scope across the dictionary, variables, definitions, and word handlers.  Pairs
    /// must balance within a single code block.
    MarkContext,

    /// Release the innermost scope marked by MarkContext.
    ReleaseContext,

    /// Unconditionally transfer control by the resolved relative offset.
    Jump(Value),

    /// Pop a boolean and jump when it is false.
    JumpIfZero(Value),

    /// Pop a boolean and jump when it is true.
    JumpIfNotZero(Value),

    /// Jump back to the start of the innermost open loop.
    JumpLoopStart,

    /// Jump past the end of the innermost open loop.
    JumpLoopExit,

    /// Landing pad for jumps.  Holds the label name during compilation and does nothing at run
    /// time.
    JumpTarget(Value),
}

impl Op {
    /// Does this operation target a jump label that resolution needs to rewrite?
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Op::Jump(_)
                | Op::JumpIfZero(_)
                | Op::JumpIfNotZero(_)
                | Op::MarkLoopExit(_)
                | Op::MarkCatch(_)
        )
    }

    /// A stable index for each operation variant, used for ordering and hashing.
    fn variant_index(&self) -> usize {
        match self {
            Op::DefVariable(_) => 0,
            Op::DefConstant(_) => 1,
            Op::ReadVariable => 2,
            Op::WriteVariable => 3,
            Op::Execute(_) => 4,
            Op::WordIndex(_) => 5,
            Op::WordExists(_) => 6,
            Op::PushConstantValue(_) => 7,
            Op::MarkLoopExit(_) => 8,
            Op::UnmarkLoopExit => 9,
            Op::MarkCatch(_) => 10,
            Op::UnmarkCatch => 11,
            Op::MarkContext => 12,
            Op::ReleaseContext => 13,
            Op::Jump(_) => 14,
            Op::JumpIfZero(_) => 15,
            Op::JumpIfNotZero(_) => 16,
            Op::JumpLoopStart => 17,
            Op::JumpLoopExit => 18,
            Op::JumpTarget(_) => 19,
        }
    }

    /// Borrow the operation's value, for the variants that carry one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Op::DefVariable(value)
            | Op::DefConstant(value)
            | Op::Execute(value)
            | Op::WordIndex(value)
            | Op::WordExists(value)
            | Op::PushConstantValue(value)
            | Op::MarkLoopExit(value)
            | Op::MarkCatch(value)
            | Op::Jump(value)
            | Op::JumpIfZero(value)
            | Op::JumpIfNotZero(value)
            | Op::JumpTarget(value) => Some(value),

            _ => None,
        }
    }

    /// Replace the operation's value in place, used by jump resolution.
    pub fn set_value(&mut self, new_value: Value) {
        match self {
            Op::DefVariable(value)
            | Op::DefConstant(value)
            | Op::Execute(value)
            | Op::WordIndex(value)
            | Op::WordExists(value)
            | Op::PushConstantValue(value)
            | Op::MarkLoopExit(value)
            | Op::MarkCatch(value)
            | Op::Jump(value)
            | Op::JumpIfZero(value)
            | Op::JumpIfNotZero(value)
            | Op::JumpTarget(value) => *value = new_value,

            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Op::DefVariable(_) => "DefVariable",
            Op::DefConstant(_) => "DefConstant",
            Op::ReadVariable => "ReadVariable",
            Op::WriteVariable => "WriteVariable",
            Op::Execute(_) => "Execute",
            Op::WordIndex(_) => "WordIndex",
            Op::WordExists(_) => "WordExists",
            Op::PushConstantValue(_) => "PushConstantValue",
            Op::MarkLoopExit(_) => "MarkLoopExit",
            Op::UnmarkLoopExit => "UnmarkLoopExit",
            Op::MarkCatch(_) => "MarkCatch",
            Op::UnmarkCatch => "UnmarkCatch",
            Op::MarkContext => "MarkContext",
            Op::ReleaseContext => "ReleaseContext",
            Op::Jump(_) => "Jump",
            Op::JumpIfZero(_) => "JumpIfZero",
            Op::JumpIfNotZero(_) => "JumpIfNotZero",
            Op::JumpLoopStart => "JumpLoopStart",
            Op::JumpLoopExit => "JumpLoopExit",
            Op::JumpTarget(_) => "JumpTarget",
        }
    }
}

impl PartialEq for Op {
    fn eq(&self, other: &Op) -> bool {
        if self.variant_index() != other.variant_index() {
            return false;
        }

        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialOrd for Op {
    fn partial_cmp(&self, other: &Op) -> Option<Ordering> {
        match self.variant_index().cmp(&other.variant_index()) {
            Ordering::Equal => match (self.value(), other.value()) {
                (Some(a), Some(b)) => a.partial_cmp(b),
                _ => Some(Ordering::Equal),
            },

            unequal => Some(unequal),
        }
    }
}

impl Hash for Op {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_index().hash(state);

        if let Some(value) = self.value() {
            value.hash(state);
        }
    }
}

/// One instruction within a block of byte-code.  The location, when present, points at the source
/// token the instruction was generated from and drives the VM's call stack and error reporting.
/// Instructions generated by user metaprogramming words have no location.
#[derive(Clone, PartialEq, Eq, PartialOrd, Debug)]
pub struct Instruction {
    pub location: Option<SourceLocation>,
    pub op: Op,
}

impl Instruction {
    pub fn new(location: Option<SourceLocation>, op: Op) -> Instruction {
        Instruction { location, op }
    }
}

impl Hash for Instruction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.hash(state);
        self.op.hash(state);
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.op.value() {
            Some(value) => {
                // Resolved jump targets hold None, which there's no point in printing.
                if matches!(self.op, Op::JumpTarget(Value::None)) {
                    write!(f, "{}", self.op.name())
                } else if let Value::String(text) = value {
                    write!(f, "{:18}{}", self.op.name(), Value::stringify(text))
                } else {
                    write!(f, "{:18}{}", self.op.name(), value)
                }
            }

            None => write!(f, "{}", self.op.name()),
        }
    }
}

/// A block of instructions making up a word body or a script's top level code.  A VecDeque allows
/// the compiler's insert-at-front mode to stay cheap.
pub type ByteCode = VecDeque<Instruction>;

/// Render a code block with instruction indices for the byte-code debugging words.
pub fn pretty_print_code(code: &ByteCode) -> String {
    use std::fmt::Write;

    let mut listing = String::with_capacity(code.len() * 24);

    for (index, instruction) in code.iter().enumerate() {
        let _ = writeln!(&mut listing, "{:4}: {}", index, instruction);
    }

    listing
}
