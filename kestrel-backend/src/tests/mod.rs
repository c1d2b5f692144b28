//! End-to-end tests for the backend


use kestrel_common::Type;
use kestrel_frontend::{Entry, FuncEntry, ScopeId, SymbolTable};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Bind `name` as a function in the global scope and return its scope
pub(crate) fn declare_function(symbols: &mut SymbolTable, name: &str, return_type: Type) -> ScopeId {
    let scope = symbols.push_scope(ScopeId::GLOBAL, name);
    symbols.insert(ScopeId::GLOBAL, name, Entry::Function(FuncEntry::new(return_type, scope)));
    scope
}

/// Lines of `asm` from the label `name:` through its `.size` directive
pub(crate) fn function_body(asm: &[String], name: &str) -> Vec<String> {
    let start = asm.iter().position(|l| *l == format!("{}:", name));
    let end = asm.iter().position(|l| l.starts_with(&format!("\t.size {},", name)));
    match (start, end) {
        (Some(start), Some(end)) => asm[start..=end].to_vec(),
        _ => Vec::new(),
    }
}
