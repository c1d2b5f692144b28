//! Program Lowering - Main entry point for lowering a program
//!
//! Produces the whole assembly file: architecture header, data section for
//! global variables, the read-only format string, then every function with
//! its boundary metadata.

use std::collections::BTreeSet;
use kestrel_codegen::{emit_instructions, AsmInst, RegisterPool};
use kestrel_common::Type;
use kestrel_frontend::{Entry, FuncFrag, Program, ScopeId, SymbolTable, VarEntry};
use log::{debug, info, warn};
use crate::error::CodegenError;
use crate::lower::context::LoweringContext;
use crate::lower::frame::FrameLayout;
use crate::lower::instruction::{lower_instruction, INT_FORMAT_LABEL};
use crate::options::CodegenOptions;

/// Lower a program to assembly lines
pub fn lower_program(
    program: &Program,
    symbols: &SymbolTable,
    options: &CodegenOptions,
) -> Result<Vec<String>, CodegenError> {
    info!("Lowering {} function(s) for {}", program.functions.len(), options.arch);

    let mut pool = RegisterPool::for_aarch64();
    let globals = symbols.global_variables();
    let global_names: BTreeSet<String> = globals.iter().map(|(name, _)| name.to_string()).collect();

    let mut asm = vec![AsmInst::Directive(format!(".arch {}", options.arch))];

    if !globals.is_empty() {
        asm.push(AsmInst::Directive(".data".to_string()));
        asm.push(AsmInst::Directive(".p2align 3".to_string()));
        for (name, var) in &globals {
            asm.push(AsmInst::Label(name.to_string()));
            asm.push(AsmInst::Directive(format!(".quad {}", initial_value(name, var))));
        }
    }

    asm.push(AsmInst::Directive(".section .rodata".to_string()));
    asm.push(AsmInst::Label(INT_FORMAT_LABEL.to_string()));
    asm.push(AsmInst::Directive(".asciz \"%ld\\n\"".to_string()));
    asm.push(AsmInst::Directive(".text".to_string()));

    for frag in &program.functions {
        if !matches!(symbols.contains(ScopeId::GLOBAL, &frag.label), Some(Entry::Function(_))) {
            warn!("Function '{}' has no function entry in the global scope", frag.label);
        }
        asm.extend(lower_function(frag, options, &global_names, &mut pool)?);
    }

    Ok(emit_instructions(&asm))
}

/// Lower one function fragment, including prologue, epilogue and boundary directives
pub fn lower_function(
    frag: &FuncFrag,
    options: &CodegenOptions,
    globals: &BTreeSet<String>,
    pool: &mut RegisterPool,
) -> Result<Vec<AsmInst>, CodegenError> {
    let layout = FrameLayout::compute(frag)?;
    let frame = layout.frame();
    let name = frag.label.as_str();
    debug!("Lowering function '{}' ({} instructions)", name, frag.len());

    let mut code = vec![
        AsmInst::Directive(format!(".type {},%function", name)),
        AsmInst::Directive(format!(".global {}", name)),
        AsmInst::Directive(".p2align 2".to_string()),
        AsmInst::Label(name.to_string()),
    ];
    code.extend(frame.gen_prologue());

    let mut ctx = LoweringContext::new(name, &layout, options, globals, pool);
    for inst in &frag.body {
        code.extend(lower_instruction(&mut ctx, inst)?);
    }

    code.push(AsmInst::Label(ctx.return_label.clone()));
    code.extend(frame.gen_epilogue());
    code.push(AsmInst::Directive(format!(".size {}, (. - {})", name, name)));

    Ok(code)
}

/// Initial `.quad` value of a global from its recorded literal
fn initial_value(name: &str, var: &VarEntry) -> i64 {
    let Some(literal) = var.value.as_deref() else {
        return 0;
    };
    match (&var.ty, literal) {
        (Type::Bool, "true") => 1,
        (Type::Bool, "false") => 0,
        (_, "nil") => 0,
        _ => literal.parse().unwrap_or_else(|_| {
            warn!("Global '{}' has non-integer initial value '{}'; using 0", name, literal);
            0
        }),
    }
}
