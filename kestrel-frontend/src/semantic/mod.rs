//! Semantic data model
//! 
//! Semantic analysis proper (type checking, duplicate detection) happens
//! upstream. This module owns the symbol table it populates:
//! - `symbols`: scopes, entries and lookups
//! - `errors`: failures raised while instantiating struct prototypes

pub mod errors;
pub mod symbols;

pub use errors::SemanticError;
pub use symbols::{SymbolTable, ScopeId, Scope, Entry, VarEntry, FuncEntry, StructEntry, GLOBAL_SCOPE_NAME};
