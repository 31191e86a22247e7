use crate::{
    add_native_word,
    lang::{
        code::Op,
        compiler::{Construction, InsertionPoint},
    },
    runtime::{
        data_structures::value::{ToValue, Value},
        error,
        interpreter::Interpreter,
    },
};

/// Pop a value and wrap it in the given instruction, appended to the construction in progress.
fn emit_with_value(
    interpreter: &mut dyn Interpreter,
    build: fn(Value) -> Op,
) -> error::Result<()> {
    let value = interpreter.pop()?;
    interpreter.insert_user_instruction(None, build(value))
}

fn emit_plain(interpreter: &mut dyn Interpreter, op: Op) -> error::Result<()> {
    interpreter.insert_user_instruction(None, op)
}

/// Start a new code block on the construction stack.
fn word_code_new_block(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter
        .compile_context_mut()
        .push_construction(Construction::new());

    Ok(())
}

/// Merge the top code block onto the end of the one below it.
fn word_code_merge_stack_block(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = interpreter.compile_context_mut().pop_construction()?.code;
    let construction = interpreter.compile_context_mut().construction_mut()?;

    construction.code.extend(code);
    Ok(())
}

/// Move the top code block from the construction stack to the data stack.
fn word_code_pop_stack_block(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = interpreter.compile_context_mut().pop_construction()?.code;

    interpreter.push(code.to_value());
    Ok(())
}

/// Move a code block from the data stack back onto the construction stack.
fn word_code_push_stack_block(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = interpreter.pop_as_code()?;

    interpreter
        .compile_context_mut()
        .push_construction(Construction::with_code(code));

    Ok(())
}

/// The instruction count of the top code block.
fn word_code_stack_block_size(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let size = interpreter.compile_context().construction()?.code.len();

    interpreter.push(size.to_value());
    Ok(())
}

/// Resolve the jump labels in the top code block to relative offsets.
fn word_code_resolve_jumps(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter
        .compile_context_mut()
        .construction_mut()?
        .resolve_jumps();

    Ok(())
}

/// Compile tokens from the source until one of the given words is found, pushing the found word.
/// The list of words to match comes from the stack, topped by their count.
fn word_code_compile_until_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let count = interpreter.pop_as_usize()?;
    let mut words = Vec::with_capacity(count);

    for _ in 0..count {
        words.push(interpreter.pop_as_string()?);
    }

    let borrowed: Vec<&str> = words.iter().map(|word| word.as_str()).collect();
    let found = crate::lang::compiler::compile_until_words(interpreter, &borrowed)?;

    interpreter.push(found.to_value());
    Ok(())
}

/// Select whether new instructions append to the current block or go in at its front.
fn word_code_insert_at_front(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let at_front = interpreter.pop_as_bool()?;

    interpreter.compile_context_mut().insertion = if at_front {
        InsertionPoint::AtFront
    } else {
        InsertionPoint::AtEnd
    };

    Ok(())
}

/// Compile and run a string as though it were a source file.
fn word_code_execute_source(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let source = interpreter.pop_as_string()?;

    interpreter.process_source("<execute_source>", &source)
}

/// Print a code block from the data stack, annotating Execute instructions with the names
/// currently bound to their handler indices.
fn word_code_print(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = interpreter.pop_as_code()?;
    let names = interpreter.inverse_name_list();

    for (index, instruction) in code.iter().enumerate() {
        let annotation = match &instruction.op {
            Op::Execute(Value::Int(handler_index)) => names
                .get(*handler_index as usize)
                .filter(|name| !name.is_empty())
                .map(|name| format!("  ; {}", name))
                .unwrap_or_default(),

            _ => String::new(),
        };

        println!("{:4}: {}{}", index, instruction, annotation);
    }

    Ok(())
}

pub fn register_bytecode_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "op.def_variable",
        |interpreter| emit_with_value(interpreter, Op::DefVariable),
        "Insert a define variable instruction into the code stream.",
        "new-name -- "
    );

    add_native_word!(
        interpreter,
        "op.def_constant",
        |interpreter| emit_with_value(interpreter, Op::DefConstant),
        "Insert a define constant instruction into the code stream.",
        "new-name -- "
    );

    add_native_word!(
        interpreter,
        "op.read_variable",
        |interpreter| emit_plain(interpreter, Op::ReadVariable),
        "Insert a read variable instruction into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.write_variable",
        |interpreter| emit_plain(interpreter, Op::WriteVariable),
        "Insert a write variable instruction into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.execute",
        |interpreter| emit_with_value(interpreter, Op::Execute),
        "Insert an execute instruction into the code stream.",
        "name-or-index -- "
    );

    add_native_word!(
        interpreter,
        "op.word_index",
        |interpreter| emit_with_value(interpreter, Op::WordIndex),
        "Insert a word index lookup instruction into the code stream.",
        "name -- "
    );

    add_native_word!(
        interpreter,
        "op.word_exists",
        |interpreter| emit_with_value(interpreter, Op::WordExists),
        "Insert a word existence check instruction into the code stream.",
        "name -- "
    );

    add_native_word!(
        interpreter,
        "op.push_constant_value",
        |interpreter| emit_with_value(interpreter, Op::PushConstantValue),
        "Insert a push constant instruction into the code stream.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "op.mark_loop_exit",
        |interpreter| emit_with_value(interpreter, Op::MarkLoopExit),
        "Insert a loop scope marker into the code stream.",
        "jump-label -- "
    );

    add_native_word!(
        interpreter,
        "op.unmark_loop_exit",
        |interpreter| emit_plain(interpreter, Op::UnmarkLoopExit),
        "Insert a loop scope unmark into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.mark_catch",
        |interpreter| emit_with_value(interpreter, Op::MarkCatch),
        "Insert a catch marker into the code stream.",
        "jump-label -- "
    );

    add_native_word!(
        interpreter,
        "op.unmark_catch",
        |interpreter| emit_plain(interpreter, Op::UnmarkCatch),
        "Insert a catch unmark into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.mark_context",
        |interpreter| emit_plain(interpreter, Op::MarkContext),
        "Insert a context mark into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.release_context",
        |interpreter| emit_plain(interpreter, Op::ReleaseContext),
        "Insert a context release into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.jump",
        |interpreter| emit_with_value(interpreter, Op::Jump),
        "Insert an unconditional jump into the code stream.",
        "jump-label -- "
    );

    add_native_word!(
        interpreter,
        "op.jump_if_zero",
        |interpreter| emit_with_value(interpreter, Op::JumpIfZero),
        "Insert a jump-if-false into the code stream.",
        "jump-label -- "
    );

    add_native_word!(
        interpreter,
        "op.jump_if_not_zero",
        |interpreter| emit_with_value(interpreter, Op::JumpIfNotZero),
        "Insert a jump-if-true into the code stream.",
        "jump-label -- "
    );

    add_native_word!(
        interpreter,
        "op.jump_loop_start",
        |interpreter| emit_plain(interpreter, Op::JumpLoopStart),
        "Insert a loop restart jump into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.jump_loop_exit",
        |interpreter| emit_plain(interpreter, Op::JumpLoopExit),
        "Insert a loop exit jump into the code stream.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "op.jump_target",
        |interpreter| emit_with_value(interpreter, Op::JumpTarget),
        "Insert a jump landing pad into the code stream.",
        "jump-label -- "
    );

    add_native_word!(
        interpreter,
        "code.new_block",
        word_code_new_block,
        "Start a new code block on the construction stack.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "code.merge_stack_block",
        word_code_merge_stack_block,
        "Merge the top code block into the one below it.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "code.pop_stack_block",
        word_code_pop_stack_block,
        "Move the top code block onto the data stack.",
        " -- code-block"
    );

    add_native_word!(
        interpreter,
        "code.push_stack_block",
        word_code_push_stack_block,
        "Move a code block from the data stack onto the construction stack.",
        "code-block -- "
    );

    add_native_word!(
        interpreter,
        "code.stack_block_size@",
        word_code_stack_block_size,
        "Read the instruction count of the top code block.",
        " -- size"
    );

    add_native_word!(
        interpreter,
        "code.resolve_jumps",
        word_code_resolve_jumps,
        "Resolve the jump labels in the top code block.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "code.compile_until_words",
        word_code_compile_until_words,
        "Compile tokens until one of the given words is found.",
        "words... count -- found-word"
    );

    add_native_word!(
        interpreter,
        "code.insert_at_front",
        word_code_insert_at_front,
        "When true, new instructions land at the front of the block.",
        "flag -- "
    );

    add_native_word!(
        interpreter,
        "code.execute_source",
        word_code_execute_source,
        "Compile and run a string as source code.",
        "source -- "
    );

    add_native_word!(
        interpreter,
        "code.print",
        word_code_print,
        "Print a code block with word name annotations.",
        "code-block -- "
    );
}
