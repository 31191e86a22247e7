use crate::{
    lang::{
        code::{ByteCode, Op},
        compiler::{process_source_tokens, CompileContext, CompileContextStack},
        source::SourceLocation,
        tokenizer::{tokenize_file, tokenize_source, NumberKind, Token, TokenList},
    },
    location_here,
    runtime::{
        data_structures::{
            array::ArrayPtr,
            byte_buffer::ByteBufferPtr,
            contextual_list::ContextualData,
            data_object::{DataDefinitionList, DataObjectDefinitionPtr, DataObjectPtr},
            dictionary::{Dictionary, Word, WordKind, WordMode, WordVisibility},
            hash_table::HashTablePtr,
            value::{DeepClone, ToValue, Value},
        },
        error::{self, script_error, script_error_str},
        interpreter::{
            sub_threads::{BlockingQueue, ThreadState, ThreadStatePtr},
            CallFrame, CallStack, CodeManagement, HandlerList, Interpreter, InterpreterStack,
            ThreadManagement, ThreadSummary, ValueStack, VariableList, WordHandler,
            WordHandlerInfo, WordManagement,
        },
    },
};
use std::{
    fs::{canonicalize, metadata},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

/// The ordered list of directories searched for script files.
pub type SearchPaths = Vec<String>;

/// The working interpreter for the Strange Forth language.
///
/// One of these owns everything a running script touches: the data stack, the dictionary with its
/// parallel handler table, the variable and structure definition lists, the stack of compile
/// contexts, and a share of the sub-thread bookkeeping.  Compilation and execution are single
/// threaded within one instance, sub-threads each get a clone of their own.
pub struct StrangeInterpreter {
    search_paths: SearchPaths,

    stack: ValueStack,
    max_depth: usize,

    current_location: Option<SourceLocation>,
    call_stack: CallStack,

    dictionary: Dictionary,
    word_handlers: HandlerList,
    variables: VariableList,
    data_definitions: DataDefinitionList,

    /// Active compile contexts.  A stack because includes and code.execute_source nest source
    /// compilation within source compilation.
    compile_contexts: CompileContextStack,

    /// Thread bookkeeping shared with every interpreter cloned from this one.
    thread_state: ThreadStatePtr,

    /// This interpreter's own id within the thread map, present only in sub-thread clones.
    thread_id: Option<u64>,

    /// Cooperative stop flag, polled by the byte-code loop between instructions.
    halted: bool,

    exit_code: i64,
}

impl Default for StrangeInterpreter {
    fn default() -> Self {
        StrangeInterpreter::new()
    }
}

impl StrangeInterpreter {
    pub fn new() -> StrangeInterpreter {
        StrangeInterpreter {
            search_paths: Vec::new(),

            stack: Vec::with_capacity(32),
            max_depth: 0,

            current_location: None,
            call_stack: CallStack::with_capacity(32),

            dictionary: Dictionary::new(),
            word_handlers: HandlerList::new(),
            variables: VariableList::new(),
            data_definitions: DataDefinitionList::new(),

            compile_contexts: CompileContextStack::new(),

            thread_state: ThreadState::new_ptr(),
            thread_id: None,

            halted: false,
            exit_code: 0,
        }
    }

    /// Build the interpreter a sub-thread runs.  All four contextual structures collapse into
    /// single base scopes, which keeps every handler and variable index valid in the clone, while
    /// the data stack, call stack, and compile state start fresh.  The thread map is shared so
    /// the clone can address, and spawn, sub-threads of its own.
    fn clone_for_sub_thread(&self) -> StrangeInterpreter {
        StrangeInterpreter {
            search_paths: self.search_paths.clone(),

            stack: Vec::with_capacity(32),
            max_depth: 0,

            current_location: None,
            call_stack: CallStack::with_capacity(32),

            dictionary: Dictionary::from_merged(self.dictionary.get_merged()),
            word_handlers: HandlerList::from_items(self.word_handlers.to_merged_vec()),
            variables: VariableList::from_items(self.variables.to_merged_vec()),
            data_definitions: DataDefinitionList::from_items(
                self.data_definitions.to_merged_vec(),
            ),

            compile_contexts: CompileContextStack::new(),

            thread_state: self.thread_state.clone(),
            thread_id: None,

            halted: false,
            exit_code: 0,
        }
    }
}

impl ContextualData for StrangeInterpreter {
    /// Scopes span all four contextual structures as one transaction.
    fn mark_context(&mut self) {
        self.dictionary.mark_context();
        self.word_handlers.mark_context();
        self.variables.mark_context();
        self.data_definitions.mark_context();
    }

    fn release_context(&mut self) {
        self.dictionary.release_context();
        self.word_handlers.release_context();
        self.variables.release_context();
        self.data_definitions.release_context();
    }
}

impl InterpreterStack for StrangeInterpreter {
    fn stack_max_depth(&self) -> usize {
        self.max_depth
    }

    fn stack(&self) -> &ValueStack {
        &self.stack
    }

    fn clear_stack(&mut self) {
        self.stack.clear();
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);

        if self.stack.len() > self.max_depth {
            self.max_depth = self.stack.len();
        }
    }

    fn pop(&mut self) -> error::Result<Value> {
        match self.stack.pop() {
            Some(value) => Ok(value),
            None => script_error_str(self, "Stack underflow."),
        }
    }

    fn pop_as_int(&mut self) -> error::Result<i64> {
        let value = self.pop()?;

        if !value.is_numeric() {
            script_error_str(self, "Expected a numeric value.")?;
        }

        Ok(value.get_int_val())
    }

    fn pop_as_usize(&mut self) -> error::Result<usize> {
        let value = self.pop_as_int()?;

        if value < 0 {
            script_error(self, format!("Expected a non-negative value, found {}.", value))?;
        }

        Ok(value as usize)
    }

    fn pop_as_float(&mut self) -> error::Result<f64> {
        let value = self.pop()?;

        if !value.is_numeric() {
            script_error_str(self, "Expected a numeric value.")?;
        }

        Ok(value.get_float_val())
    }

    fn pop_as_bool(&mut self) -> error::Result<bool> {
        let value = self.pop()?;

        if !value.is_numeric() && !value.is_string() {
            script_error_str(self, "Expected a boolean value.")?;
        }

        Ok(value.get_bool_val())
    }

    fn pop_as_string(&mut self) -> error::Result<String> {
        let value = self.pop()?;

        if !value.is_stringable() {
            script_error_str(self, "Expected a string value.")?;
        }

        Ok(value.get_string_val())
    }

    fn pop_as_array(&mut self) -> error::Result<ArrayPtr> {
        let value = self.pop()?;
        Ok(value.as_array(self)?.clone())
    }

    fn pop_as_hash_table(&mut self) -> error::Result<HashTablePtr> {
        let value = self.pop()?;
        Ok(value.as_hash_table(self)?.clone())
    }

    fn pop_as_structure(&mut self) -> error::Result<DataObjectPtr> {
        let value = self.pop()?;
        Ok(value.as_structure(self)?.clone())
    }

    fn pop_as_byte_buffer(&mut self) -> error::Result<ByteBufferPtr> {
        let value = self.pop()?;
        Ok(value.as_byte_buffer(self)?.clone())
    }

    fn pop_as_token(&mut self) -> error::Result<Token> {
        let value = self.pop()?;
        Ok(value.as_token(self)?.clone())
    }

    fn pop_as_code(&mut self) -> error::Result<ByteCode> {
        let value = self.pop()?;
        Ok(value.as_code(self)?.clone())
    }

    fn pop_as_thread_id(&mut self) -> error::Result<u64> {
        let value = self.pop()?;

        match value {
            Value::ThreadId(id) => Ok(id),
            _ => script_error(self, format!("Value {} is not a thread id.", value)),
        }
    }

    fn pick(&mut self, index: usize) -> error::Result<Value> {
        if index >= self.stack.len() {
            script_error_str(self, "Stack underflow in pick.")?;
        }

        let position = self.stack.len() - 1 - index;
        Ok(self.stack.remove(position))
    }

    fn push_to(&mut self, index: usize) -> error::Result<()> {
        if self.stack.is_empty() || index >= self.stack.len() {
            script_error_str(self, "Stack underflow in push-to.")?;
        }

        let value = self.stack.pop().unwrap();
        let position = self.stack.len() - index;

        self.stack.insert(position, value);
        Ok(())
    }
}

/// Per-instruction helpers for the byte-code loop.
impl StrangeInterpreter {
    /// Allocate a variable slot and bind a word with the variable's name that pushes the slot's
    /// index.
    fn define_variable(&mut self, name_value: &Value) -> error::Result<()> {
        if !name_value.is_stringable() {
            return script_error(self, format!("Invalid variable name {}.", name_value));
        }

        let name = name_value.get_string_val();
        let index = self.variables.insert(Value::default());

        let handler = move |interpreter: &mut dyn Interpreter| -> error::Result<()> {
            interpreter.push(index.to_value());
            Ok(())
        };

        crate::add_native_word!(
            self,
            &name,
            handler,
            format!("Access the index of the variable {}.", name),
            " -- variable-index"
        );

        Ok(())
    }

    /// Pop a value and bind a word with the constant's name that pushes a copy of it.
    fn define_constant(&mut self, name_value: &Value) -> error::Result<()> {
        if !name_value.is_stringable() {
            return script_error(self, format!("Invalid constant name {}.", name_value));
        }

        let name = name_value.get_string_val();
        let constant = self.pop()?;

        let handler = move |interpreter: &mut dyn Interpreter| -> error::Result<()> {
            interpreter.push(constant.deep_clone());
            Ok(())
        };

        crate::add_native_word!(
            self,
            &name,
            handler,
            format!("Access the value of the constant {}.", name),
            " -- constant-value"
        );

        Ok(())
    }

    fn read_variable(&mut self) -> error::Result<()> {
        let index = self.pop_as_usize()?;

        if index >= self.variables.len() {
            return script_error(
                self,
                format!("Read index {} is out of range of the variable list.", index),
            );
        }

        let value = self.variables[index].clone();

        self.push(value);
        Ok(())
    }

    fn write_variable(&mut self) -> error::Result<()> {
        let index = self.pop_as_usize()?;
        let value = self.pop()?;

        if index >= self.variables.len() {
            return script_error(
                self,
                format!("Write index {} is out of range of the variable list.", index),
            );
        }

        self.variables[index] = value;
        Ok(())
    }

    /// Dispatch an Execute instruction.  A string resolves by name, an integer is a handler
    /// index, and a word token executes by its name.
    fn execute_value(&mut self, value: &Value) -> error::Result<()> {
        let location = match &self.current_location {
            Some(location) => location.clone(),
            None => location_here!(),
        };

        match value {
            Value::String(name) => self.execute_word_named(&location, name),
            Value::Int(index) => self.execute_word_index(&location, *index as usize),

            Value::Token(Token::Word(token_location, name)) => {
                let token_location = token_location.clone();
                let name = name.clone();

                self.execute_word_named(&token_location, &name)
            }

            _ => script_error(self, format!("Value {} is not executable.", value)),
        }
    }

    /// Resolve a word name to its handler index and push it.
    fn push_word_index(&mut self, name_value: &Value) -> error::Result<()> {
        if !name_value.is_stringable() {
            return script_error(self, format!("Invalid word name {}.", name_value));
        }

        let name = name_value.get_string_val();

        match self.dictionary.find(&name) {
            Some(word) => {
                let index = word.handler_index as i64;

                self.push(index.to_value());
                Ok(())
            }

            None => script_error(self, format!("Word {} not found.", name)),
        }
    }

    /// Push whether a word is currently defined.
    fn push_word_exists(&mut self, name_value: &Value) -> error::Result<()> {
        if !name_value.is_stringable() {
            return script_error(self, format!("Invalid word name {}.", name_value));
        }

        let name = name_value.get_string_val();
        let found = self.dictionary.find(&name).is_some();

        self.push(found.to_value());
        Ok(())
    }

    /// Constants push as deep copies so scripts can't reach back and mutate the compiled
    /// instruction's value through a container reference.
    fn push_constant_value(&mut self, value: &Value) -> error::Result<()> {
        let copy = value.deep_clone();

        self.push(copy);
        Ok(())
    }

    /// Turn a resolved relative jump offset into an absolute instruction index.
    fn absolute_index(&self, pc: usize, offset: &Value) -> error::Result<usize> {
        if !offset.is_numeric() {
            return script_error(
                self,
                format!("Unresolved jump target {} in executing code.", offset),
            );
        }

        let absolute = pc as i64 + offset.get_int_val();

        if absolute < 0 {
            return script_error(self, format!("Jump to a negative index {}.", absolute));
        }

        Ok(absolute as usize)
    }
}

impl CodeManagement for StrangeInterpreter {
    fn next_token(&mut self) -> error::Result<Token> {
        match self.compile_context_mut().next_token() {
            Some(token) => Ok(token),
            None => script_error_str(self, "Read past the end of the token stream."),
        }
    }

    fn next_token_text(&mut self) -> error::Result<String> {
        let token = self.next_token()?;
        let text = token.text(self)?.clone();

        Ok(text)
    }

    fn next_token_string(&mut self) -> error::Result<String> {
        let token = self.next_token()?;
        let text = token.string(self)?.clone();

        Ok(text)
    }

    fn next_token_number(&mut self) -> error::Result<NumberKind> {
        let token = self.next_token()?;
        token.number(self)
    }

    fn next_token_word(&mut self) -> error::Result<(SourceLocation, String)> {
        let token = self.next_token()?;
        let word = token.word(self)?.clone();
        let location = token.location().clone();

        Ok((location, word))
    }

    fn is_compiling(&self) -> bool {
        !self.compile_contexts.is_empty()
    }

    fn compile_context_new(&mut self, tokens: TokenList) {
        self.compile_contexts.push(CompileContext::new(tokens));
    }

    fn compile_context_drop(&mut self) -> error::Result<()> {
        if self.compile_contexts.is_empty() {
            script_error_str(self, "Compile context stack underflow.")?;
        }

        let _ = self.compile_contexts.pop();
        Ok(())
    }

    fn compile_context(&self) -> &CompileContext {
        self.compile_contexts
            .last()
            .expect("No compilation is in progress.")
    }

    fn compile_context_mut(&mut self) -> &mut CompileContext {
        self.compile_contexts
            .last_mut()
            .expect("No compilation is in progress.")
    }

    fn process_source_file(&mut self, path: &str) -> error::Result<()> {
        let full_path = self.find_file(path)?;
        let tokens = tokenize_file(&full_path)?;

        self.add_search_path_for_file(&full_path)?;

        let result = process_source_tokens(self, tokens);

        self.drop_search_path()?;
        result
    }

    fn process_source(&mut self, path: &str, source: &str) -> error::Result<()> {
        let tokens = tokenize_source(path, source)?;
        process_source_tokens(self, tokens)
    }

    fn execute_code(&mut self, name: &str, code: &ByteCode) -> error::Result<()> {
        // Loop scopes, armed catches, and the context balance are all per invocation.  Word calls
        // re-enter this function, each call gets its own markers.
        let mut loop_markers = Vec::<(usize, usize)>::new();
        let mut catch_markers = Vec::<usize>::new();
        let mut marked_contexts: usize = 0;

        let mut pc: usize = 0;

        while pc < code.len() {
            // Halting is polled between instructions, the current instruction always finishes.
            if self.halted {
                break;
            }

            let instruction = &code[pc];
            let mut frame_pushed = false;

            if let Some(location) = &instruction.location {
                self.current_location = Some(location.clone());
                self.call_stack_push(name.to_string(), location.clone());
                frame_pushed = true;
            }

            let mut next_pc = pc + 1;

            let result: error::Result<()> = match &instruction.op {
                Op::DefVariable(value) => self.define_variable(value),
                Op::DefConstant(value) => self.define_constant(value),
                Op::ReadVariable => self.read_variable(),
                Op::WriteVariable => self.write_variable(),
                Op::Execute(value) => self.execute_value(value),
                Op::WordIndex(value) => self.push_word_index(value),
                Op::WordExists(value) => self.push_word_exists(value),
                Op::PushConstantValue(value) => self.push_constant_value(value),

                Op::MarkLoopExit(value) => match self.absolute_index(pc, value) {
                    Ok(exit_index) => {
                        loop_markers.push((pc + 1, exit_index));
                        Ok(())
                    }

                    Err(error) => Err(error),
                },

                Op::UnmarkLoopExit => {
                    if loop_markers.pop().is_some() {
                        Ok(())
                    } else {
                        script_error_str(self, "Unbalanced loop unmark.")
                    }
                }

                Op::MarkCatch(value) => match self.absolute_index(pc, value) {
                    Ok(catch_index) => {
                        catch_markers.push(catch_index);
                        Ok(())
                    }

                    Err(error) => Err(error),
                },

                Op::UnmarkCatch => {
                    if catch_markers.pop().is_some() {
                        Ok(())
                    } else {
                        script_error_str(self, "Unbalanced catch unmark.")
                    }
                }

                Op::MarkContext => {
                    self.mark_context();
                    marked_contexts += 1;

                    Ok(())
                }

                Op::ReleaseContext => {
                    if marked_contexts > 0 {
                        self.release_context();
                        marked_contexts -= 1;

                        Ok(())
                    } else {
                        script_error_str(self, "Unbalanced context release.")
                    }
                }

                Op::Jump(value) => match self.absolute_index(pc, value) {
                    Ok(target) => {
                        next_pc = target;
                        Ok(())
                    }

                    Err(error) => Err(error),
                },

                Op::JumpIfZero(value) => {
                    // Pop the flag first so the stack stays balanced even when the offset is bad.
                    match self.pop_as_bool() {
                        Ok(flag) => match self.absolute_index(pc, value) {
                            Ok(target) => {
                                if !flag {
                                    next_pc = target;
                                }

                                Ok(())
                            }

                            Err(error) => Err(error),
                        },

                        Err(error) => Err(error),
                    }
                }

                Op::JumpIfNotZero(value) => match self.pop_as_bool() {
                    Ok(flag) => match self.absolute_index(pc, value) {
                        Ok(target) => {
                            if flag {
                                next_pc = target;
                            }

                            Ok(())
                        }

                        Err(error) => Err(error),
                    },

                    Err(error) => Err(error),
                },

                Op::JumpLoopStart => match loop_markers.last() {
                    Some((start, _)) => {
                        next_pc = *start;
                        Ok(())
                    }

                    None => script_error_str(self, "Loop restart outside of a loop."),
                },

                Op::JumpLoopExit => match loop_markers.last() {
                    Some((_, exit)) => {
                        next_pc = *exit;
                        Ok(())
                    }

                    None => script_error_str(self, "Loop exit outside of a loop."),
                },

                Op::JumpTarget(_) => Ok(()),
            };

            if frame_pushed {
                let _ = self.call_stack.pop();
            }

            if let Err(raised) = result {
                match catch_markers.pop() {
                    // A catch is armed: deliver the message there and resume.
                    Some(catch_index) => {
                        self.push(raised.message().clone().to_value());
                        next_pc = catch_index;
                    }

                    // No local handler.  Re-balance any contexts this block marked and unwind.
                    None => {
                        for _ in 0..marked_contexts {
                            self.release_context();
                        }

                        return Err(raised);
                    }
                }
            }

            pc = next_pc;
        }

        if marked_contexts > 0 {
            for _ in 0..marked_contexts {
                self.release_context();
            }

            script_error_str(self, "Unbalanced context marks at end of code block.")?;
        }

        Ok(())
    }
}

impl WordManagement for StrangeInterpreter {
    fn current_location(&self) -> &Option<SourceLocation> {
        &self.current_location
    }

    fn add_word(
        &mut self,
        file: String,
        line: usize,
        column: usize,
        name: String,
        handler: Arc<WordHandler>,
        description: String,
        signature: String,
        mode: WordMode,
        visibility: WordVisibility,
        kind: WordKind,
    ) {
        let location = SourceLocation::from_parts(&file, line, column);

        let handler_info = WordHandlerInfo::new(name.clone(), location.clone(), handler);
        let index = self.word_handlers.insert(handler_info);

        let mut word = Word::new(name.clone(), location);

        word.description = description;
        word.signature = signature;
        word.mode = mode;
        word.visibility = visibility;
        word.kind = kind;
        word.handler_index = index;

        self.dictionary.insert(name, word);
    }

    fn add_structure_definition(&mut self, definition: DataObjectDefinitionPtr) {
        self.data_definitions.insert(definition);
    }

    fn find_word(&self, name: &str) -> Option<&Word> {
        self.dictionary.find(name)
    }

    fn word_handler_info(&self, index: usize) -> Option<&WordHandlerInfo> {
        if index >= self.word_handlers.len() {
            return None;
        }

        Some(&self.word_handlers[index])
    }

    fn inverse_name_list(&self) -> Vec<String> {
        self.dictionary.inverse_lookup(self.word_handlers.len())
    }

    fn execute_word(&mut self, location: &SourceLocation, word: &Word) -> error::Result<()> {
        match self.word_handler_info(word.handler_index) {
            Some(handler_info) => {
                let handler_info = handler_info.clone();

                self.current_location = Some(location.clone());
                self.call_stack
                    .push(CallFrame::new(handler_info.name().clone(), location.clone()));

                let result = (*handler_info.handler())(self);

                let _ = self.call_stack.pop();
                result
            }

            None => script_error(
                self,
                format!(
                    "The handler {} for the word {} was not found.",
                    word.handler_index, word.name
                ),
            ),
        }
    }

    fn execute_word_named(&mut self, location: &SourceLocation, name: &str) -> error::Result<()> {
        match self.dictionary.find(name) {
            Some(word) => {
                let word = word.clone();
                self.execute_word(location, &word)
            }

            None => script_error(self, format!("Word {} not found.", name)),
        }
    }

    fn execute_word_index(
        &mut self,
        location: &SourceLocation,
        index: usize,
    ) -> error::Result<()> {
        match self.word_handler_info(index) {
            Some(handler_info) => {
                let handler_info = handler_info.clone();

                self.current_location = Some(location.clone());
                self.call_stack
                    .push(CallFrame::new(handler_info.name().clone(), location.clone()));

                let result = (*handler_info.handler())(self);

                let _ = self.call_stack.pop();
                result
            }

            None => script_error(self, format!("Word handler index {} not found.", index)),
        }
    }

    fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    fn call_stack_push(&mut self, name: String, location: SourceLocation) {
        self.call_stack.push(CallFrame::new(name, location));
    }

    fn call_stack_pop(&mut self) -> error::Result<()> {
        if self.call_stack.is_empty() {
            script_error_str(self, "Call stack underflow.")?;
        }

        let _ = self.call_stack.pop();
        Ok(())
    }
}

impl ThreadManagement for StrangeInterpreter {
    fn execute_word_threaded(&mut self, word: &Word) -> error::Result<u64> {
        let inputs = BlockingQueue::new_ptr();
        let outputs = BlockingQueue::new_ptr();

        let id = self
            .thread_state
            .register(word.clone(), inputs, outputs);

        let mut child = self.clone_for_sub_thread();

        child.thread_id = Some(id);

        let child_word = word.clone();
        let thread_state = self.thread_state.clone();

        let handle = thread::spawn(move || {
            let location = child_word.location.clone();

            // A failing sub-thread dies silently, its parent notices through missing outputs.
            let _ = child.execute_word(&location, &child_word);

            thread_state.finish(id);
        });

        self.thread_state.attach_handle(id, handle);

        Ok(id)
    }

    fn thread_push_input(&mut self, id: u64, value: Value) -> error::Result<()> {
        match self.thread_state.inputs_of(id) {
            Some(queue) => {
                queue.push(value);
                Ok(())
            }

            None => script_error(self, format!("Unknown thread id {}.", id)),
        }
    }

    fn thread_pop_input(&mut self) -> error::Result<Value> {
        let id = match self.thread_id {
            Some(id) => id,
            None => return script_error_str(self, "The current thread has no input queue."),
        };

        match self.thread_state.inputs_of(id) {
            Some(queue) => Ok(queue.pop()),
            None => script_error(self, format!("Unknown thread id {}.", id)),
        }
    }

    fn thread_push_output(&mut self, value: Value) -> error::Result<()> {
        let id = match self.thread_id {
            Some(id) => id,
            None => return script_error_str(self, "The current thread has no output queue."),
        };

        match self.thread_state.outputs_of(id) {
            Some(queue) => {
                queue.push(value);
                Ok(())
            }

            None => script_error(self, format!("Unknown thread id {}.", id)),
        }
    }

    fn thread_pop_output(&mut self, id: u64) -> error::Result<Value> {
        let queue = match self.thread_state.outputs_of(id) {
            Some(queue) => queue,
            None => return script_error(self, format!("Unknown thread id {}.", id)),
        };

        // Block outside of the map lock, the producer needs the map to stay usable.
        let value = queue.pop();

        // A finished thread is reaped once its last output has been drained.
        if let Some(handle) = self.thread_state.reap_if_drained(id) {
            let _ = handle.join();
        }

        Ok(value)
    }

    fn sub_threads(&self) -> Vec<ThreadSummary> {
        self.thread_state.summaries()
    }
}

impl Interpreter for StrangeInterpreter {
    fn add_search_path(&mut self, path: &str) -> error::Result<()> {
        if let Err(error) = metadata(path) {
            script_error(self, format!("Could not add search path {}: {}.", path, error))?;
        }

        self.search_paths.push(path.to_string());
        Ok(())
    }

    fn add_search_path_for_file(&mut self, file_path: &str) -> error::Result<()> {
        if let Some(parent) = Path::new(file_path).parent() {
            let parent = parent.to_string_lossy();
            self.add_search_path(&parent)?;
        }

        Ok(())
    }

    fn drop_search_path(&mut self) -> error::Result<()> {
        if self.search_paths.is_empty() {
            script_error_str(self, "Search path stack underflow.")?;
        }

        let _ = self.search_paths.pop();
        Ok(())
    }

    fn search_paths(&self) -> &Vec<String> {
        &self.search_paths
    }

    fn find_file(&self, path: &str) -> error::Result<String> {
        fn canonical_string(
            interpreter: &dyn Interpreter,
            path: PathBuf,
        ) -> error::Result<String> {
            let canonical = canonicalize(path)?;

            match canonical.to_str() {
                Some(text) => Ok(text.to_string()),
                None => script_error_str(interpreter, "Path contains invalid characters."),
            }
        }

        if Path::new(path).exists() {
            return canonical_string(self, PathBuf::from(path));
        }

        for directory in self.search_paths.iter().rev() {
            let candidate = PathBuf::from(directory).join(path);

            if candidate.exists() {
                return canonical_string(self, candidate);
            }
        }

        script_error(self, format!("File {} not found.", path))
    }

    fn variables(&self) -> &VariableList {
        &self.variables
    }

    fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn structure_definitions(&self) -> &DataDefinitionList {
        &self.data_definitions
    }

    fn reset(&mut self) -> error::Result<()> {
        self.release_context();
        self.stack.clear();
        self.mark_context();

        Ok(())
    }

    fn halt(&mut self) {
        self.halted = true;
    }

    fn clear_halt_flag(&mut self) {
        self.halted = false;
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn exit_code(&self) -> i64 {
        self.exit_code
    }

    fn set_exit_code(&mut self, code: i64) {
        self.exit_code = code;
    }
}
