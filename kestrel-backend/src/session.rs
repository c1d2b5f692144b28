//! Compilation Session
//!
//! Owns the state one compilation unit threads through the back half: the
//! virtual register counter and the symbol table. Hosts compiling several
//! units create one session per unit.

use kestrel_codegen::join_lines;
use kestrel_common::VRegAllocator;
use kestrel_frontend::{FragBuilder, Program, ScopeId, SemanticError, SymbolTable};
use crate::error::CodegenError;
use crate::lower::lower_program;
use crate::options::CodegenOptions;

#[derive(Debug, Default)]
pub struct CompilationSession {
    pub vregs: VRegAllocator,
    pub symbols: SymbolTable,
    pub options: CodegenOptions,
}

impl CompilationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodegenOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Start a function fragment that draws registers from this session
    pub fn builder(&mut self, label: impl Into<String>) -> FragBuilder<'_> {
        FragBuilder::new(label, &mut self.vregs)
    }

    /// Instantiate a struct prototype with registers from this session
    pub fn instantiate(&mut self, proto: ScopeId, scope_name: &str, parent: ScopeId) -> Result<ScopeId, SemanticError> {
        self.symbols.instantiate(proto, scope_name, parent, &mut self.vregs)
    }

    /// Lower a program to assembly lines
    pub fn compile(&self, program: &Program) -> Result<Vec<String>, CodegenError> {
        lower_program(program, &self.symbols, &self.options)
    }

    /// Lower a program to one newline-terminated assembly text
    pub fn compile_to_string(&self, program: &Program) -> Result<String, CodegenError> {
        Ok(join_lines(&self.compile(program)?))
    }

    /// Drop all per-unit state, keeping the options
    pub fn reset(&mut self) {
        self.vregs.reset();
        self.symbols = SymbolTable::new();
    }
}
