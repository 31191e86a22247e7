use crate::{
    lang::{
        code::{ByteCode, Instruction, Op},
        source::SourceLocation,
        tokenizer::{Token, TokenList},
    },
    runtime::{
        data_structures::{
            dictionary::{WordContext, WordMode, WordVisibility},
            value::{ToValue, Value},
        },
        error::{self, ScriptError},
        interpreter::Interpreter,
    },
};
use std::collections::HashMap;

/// An in-progress block of byte-code along with the metadata needed to register it as a word.
/// The top level code of a script is built in an anonymous construction, while the word creation
/// words stack new constructions on top of it.
#[derive(Clone)]
pub struct Construction {
    pub name: String,
    pub location: SourceLocation,
    pub description: String,
    pub signature: String,

    pub mode: WordMode,
    pub visibility: WordVisibility,
    pub context: WordContext,

    pub code: ByteCode,
}

impl Default for Construction {
    fn default() -> Self {
        Construction::new()
    }
}

impl Construction {
    pub fn new() -> Construction {
        Construction {
            name: String::new(),
            location: SourceLocation::new(),
            description: String::new(),
            signature: String::new(),

            mode: WordMode::Normal,
            visibility: WordVisibility::Visible,
            context: WordContext::Managed,

            code: ByteCode::new(),
        }
    }

    pub fn with_code(code: ByteCode) -> Construction {
        let mut construction = Construction::new();

        construction.code = code;
        construction
    }

    /// Rewrite jump label names into relative instruction offsets.
    ///
    /// The pass records the index of every JumpTarget by label, blanks the targets, and then
    /// patches each jump style instruction from its label to `target_index - jump_index`.  A jump
    /// to a label with no target is left alone and will fail with a clear error when it runs.
    pub fn resolve_jumps(&mut self) {
        let mut jump_sites = Vec::new();
        let mut targets = HashMap::new();

        for (index, instruction) in self.code.iter_mut().enumerate() {
            if instruction.op.is_jump() {
                jump_sites.push(index);
            } else if let Op::JumpTarget(label) = &instruction.op {
                if let Value::String(name) = label {
                    targets.insert(name.clone(), index);
                    instruction.op.set_value(Value::None);
                }
            }
        }

        for site in jump_sites {
            let label = match self.code[site].op.value() {
                Some(Value::String(name)) => name.clone(),
                _ => continue,
            };

            if let Some(&target) = targets.get(&label) {
                let offset = target as i64 - site as i64;
                self.code[site].op.set_value(offset.to_value());
            }
        }
    }
}

/// Where newly generated instructions land in the current construction.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    AtEnd,
    AtFront,
}

/// The compile state for one source unit: the token stream with its read cursor and the stack of
/// constructions being generated from it.
///
/// The interpreter keeps a stack of these so that immediate words, which run in the middle of
/// compilation, can re-enter the compiler for nested sources.  Token cursor movement made by an
/// immediate word is seen by the outer compile loop.
pub struct CompileContext {
    constructions: Vec<Construction>,

    pub insertion: InsertionPoint,

    tokens: TokenList,
    cursor: usize,
}

impl CompileContext {
    /// Take ownership of a token list and start compiling it with a single anonymous
    /// construction.
    pub fn new(tokens: TokenList) -> CompileContext {
        CompileContext {
            constructions: vec![Construction::new()],
            insertion: InsertionPoint::AtEnd,
            tokens,
            cursor: 0,
        }
    }

    /// Advance the cursor and return the next token, or None at the end of the stream.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.cursor >= self.tokens.len() {
            return None;
        }

        let token = self.tokens[self.cursor].clone();
        self.cursor += 1;

        Some(token)
    }

    /// The construction currently receiving instructions.
    pub fn construction(&self) -> error::Result<&Construction> {
        match self.constructions.last() {
            Some(construction) => Ok(construction),
            None => ScriptError::new_as_result(
                None,
                "Access of an empty construction stack.".to_string(),
                None,
            ),
        }
    }

    pub fn construction_mut(&mut self) -> error::Result<&mut Construction> {
        match self.constructions.last_mut() {
            Some(construction) => Ok(construction),
            None => ScriptError::new_as_result(
                None,
                "Access of an empty construction stack.".to_string(),
                None,
            ),
        }
    }

    /// Stack a fresh construction, as done by the word creation and code block words.
    pub fn push_construction(&mut self, construction: Construction) {
        self.constructions.push(construction);
    }

    /// Remove and return the top construction.
    pub fn pop_construction(&mut self) -> error::Result<Construction> {
        match self.constructions.pop() {
            Some(construction) => Ok(construction),
            None => ScriptError::new_as_result(
                None,
                "Pop of an empty construction stack.".to_string(),
                None,
            ),
        }
    }

    /// Add an instruction to the current construction, honoring the insertion point flag.
    pub fn insert_instruction(&mut self, instruction: Instruction) -> error::Result<()> {
        let at_front = self.insertion == InsertionPoint::AtFront;
        let construction = self.construction_mut()?;

        if at_front {
            construction.code.push_front(instruction);
        } else {
            construction.code.push_back(instruction);
        }

        Ok(())
    }
}

/// The stack of active compile contexts held by the interpreter.
pub type CompileContextStack = Vec<CompileContext>;

/// Compile a single token into the current construction.
///
/// Word and number shaped tokens are first tried against the dictionary.  A hit on an immediate
/// word executes it right now, which is how the language's syntax words run.  A hit on a normal
/// word compiles a call by handler index.  Misses compile as a by-name call resolved at run time,
/// or as constant pushes for numbers and strings.
pub fn compile_token(interpreter: &mut dyn Interpreter, token: Token) -> error::Result<()> {
    let lookup = match &token {
        Token::Word(location, name) => Some((location.clone(), name.clone())),

        // Numbers can be word names too, for example a word named 2dup.
        Token::Number(location, number) => Some((location.clone(), number.to_string())),

        Token::String(_, _) => None,
    };

    if let Some((location, name)) = lookup {
        if let Some(word) = interpreter.find_word(&name) {
            let word = word.clone();

            if let WordMode::Immediate = word.mode {
                return interpreter.execute_word(&location, &word);
            }

            let index = word.handler_index as i64;
            let instruction = Instruction::new(Some(location), Op::Execute(index.to_value()));

            return interpreter.compile_context_mut().insert_instruction(instruction);
        }
    }

    let instruction = match token {
        Token::Word(location, name) => {
            Instruction::new(Some(location), Op::Execute(name.to_value()))
        }

        Token::Number(location, number) => {
            Instruction::new(Some(location), Op::PushConstantValue(number.to_value()))
        }

        Token::String(location, text) => {
            Instruction::new(Some(location), Op::PushConstantValue(text.to_value()))
        }
    };

    interpreter.compile_context_mut().insert_instruction(instruction)
}

/// Compile tokens from the current context until one of the given words appears as a word token.
/// The matched word is returned without being compiled.  Running out of tokens raises an error
/// that cites the location where the search began and the words that were expected.
pub fn compile_until_words(
    interpreter: &mut dyn Interpreter,
    words: &[&str],
) -> error::Result<String> {
    let mut start_location: Option<SourceLocation> = None;

    loop {
        match interpreter.compile_context_mut().next_token() {
            Some(token) => {
                if start_location.is_none() {
                    start_location = Some(token.location().clone());
                }

                if let Token::Word(_, name) = &token {
                    if words.iter().any(|word| word == name) {
                        return Ok(name.clone());
                    }
                }

                compile_token(interpreter, token)?;
            }

            None => {
                let message = if words.len() == 1 {
                    format!("Missing word {} in source.", words[0])
                } else {
                    format!("Missing one of the words [ {} ] in source.", words.join(" "))
                };

                return ScriptError::new_as_result(start_location, message, None);
            }
        }
    }
}

/// Compile and run a token list as one source unit.
///
/// A new compile context is stacked for the tokens, every token is compiled, (driving any
/// immediate words encountered along the way,) and the finished top level construction has its
/// jumps resolved and is executed in the current interpreter context.
pub fn process_source_tokens(
    interpreter: &mut dyn Interpreter,
    tokens: TokenList,
) -> error::Result<()> {
    interpreter.compile_context_new(tokens);

    loop {
        let token = interpreter.compile_context_mut().next_token();

        match token {
            Some(token) => {
                if let Err(error) = compile_token(interpreter, token) {
                    interpreter.compile_context_drop()?;
                    return Err(error);
                }
            }

            None => break,
        }
    }

    let code = {
        let result = interpreter.compile_context_mut().pop_construction();

        match result {
            Ok(mut construction) => {
                construction.resolve_jumps();
                interpreter.compile_context_drop()?;

                construction.code
            }

            Err(error) => {
                interpreter.compile_context_drop()?;
                return Err(error);
            }
        }
    };

    interpreter.execute_code("<toplevel>", &code)
}
