//! Scope-chained symbol table
//!
//! Scopes live in an arena owned by [`SymbolTable`] and point at their
//! enclosing scope through a [`ScopeId`]. Scope 0 is always the global scope.
//! A scope's parent is created before the scope itself, so the parent chain
//! is acyclic.

use kestrel_common::{Type, VReg, VRegAllocator};
use log::{debug, trace, warn};
use std::collections::BTreeMap;

use crate::semantic::errors::SemanticError;

/// Name of the root scope
pub const GLOBAL_SCOPE_NAME: &str = "global";

/// Index of a scope inside its [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// A variable: its type, an optional literal value and the register naming its storage
#[derive(Debug, Clone, PartialEq)]
pub struct VarEntry {
    pub ty: Type,
    pub value: Option<String>,
    pub vreg: VReg,
    /// Instance scope when the variable holds a struct by value
    pub fields: Option<ScopeId>,
}

impl VarEntry {
    /// Create a variable backed by a fresh virtual register
    pub fn new(ty: Type, vregs: &mut VRegAllocator) -> Self {
        Self {
            ty,
            value: None,
            vreg: vregs.allocate(),
            fields: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn set_type(&mut self, ty: Type) {
        self.ty = ty;
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }
}

/// A function: expected return type and the scope holding parameters and locals
#[derive(Debug, Clone, PartialEq)]
pub struct FuncEntry {
    pub return_type: Type,
    pub scope: ScopeId,
}

impl FuncEntry {
    pub fn new(return_type: Type, scope: ScopeId) -> Self {
        Self { return_type, scope }
    }
}

/// A struct type declaration: its field layout scope is the prototype for instances
#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    pub name: String,
    pub scope: ScopeId,
    pub vreg: VReg,
}

impl StructEntry {
    pub fn new(name: impl Into<String>, scope: ScopeId, vregs: &mut VRegAllocator) -> Self {
        Self {
            name: name.into(),
            scope,
            vreg: vregs.allocate(),
        }
    }
}

/// Symbol table entry
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Variable(VarEntry),
    Function(FuncEntry),
    Struct(StructEntry),
}

impl Entry {
    /// Type tag of the entry, valid for every variant
    pub fn entry_type(&self) -> Type {
        match self {
            Entry::Variable(var) => var.ty.clone(),
            Entry::Function(_) => Type::Function,
            Entry::Struct(st) => Type::Struct(st.name.clone()),
        }
    }

    /// Register naming the entry's storage; functions have none
    pub fn vreg(&self) -> Option<VReg> {
        match self {
            Entry::Variable(var) => Some(var.vreg),
            Entry::Struct(st) => Some(st.vreg),
            Entry::Function(_) => None,
        }
    }

    /// Nested scope: function body, struct layout, or struct instance fields
    pub fn scope(&self) -> Option<ScopeId> {
        match self {
            Entry::Variable(var) => var.fields,
            Entry::Function(func) => Some(func.scope),
            Entry::Struct(st) => Some(st.scope),
        }
    }

    pub fn return_type(&self) -> Option<&Type> {
        match self {
            Entry::Function(func) => Some(&func.return_type),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VarEntry> {
        match self {
            Entry::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut VarEntry> {
        match self {
            Entry::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FuncEntry> {
        match self {
            Entry::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructEntry> {
        match self {
            Entry::Struct(st) => Some(st),
            _ => None,
        }
    }
}

/// One lexical scope
#[derive(Debug, Clone)]
pub struct Scope {
    parent: Option<ScopeId>,
    entries: BTreeMap<String, Entry>,
    name: String,
    /// Parameter order for functions, field order for struct types
    param_names: Vec<String>,
    param_types: Vec<Type>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, name: &str) -> Self {
        Self {
            parent,
            entries: BTreeMap::new(),
            name: name.to_string(),
            param_names: Vec::new(),
            param_types: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn param_types(&self) -> &[Type] {
        &self.param_types
    }

    /// Entries in name order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Arena of scopes rooted at the global scope
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, GLOBAL_SCOPE_NAME)],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId::GLOBAL
    }

    /// Open a scope nested in `parent`
    pub fn push_scope(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(parent), name));
        trace!("Opened scope {id:?} '{name}' under {parent:?}");
        id
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Look up `name` in `scope` only
    pub fn contains(&self, scope: ScopeId, name: &str) -> Option<&Entry> {
        self.scopes.get(scope.0)?.entries.get(name)
    }

    pub fn entry_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut Entry> {
        self.scopes.get_mut(scope.0)?.entries.get_mut(name)
    }

    /// Bind `name` in `scope`, returning the binding it replaced
    pub fn insert(&mut self, scope: ScopeId, name: impl Into<String>, entry: Entry) -> Option<Entry> {
        let name = name.into();
        match self.scopes.get_mut(scope.0) {
            Some(target) => {
                trace!("Insert '{}' into scope '{}'", name, target.name);
                target.entries.insert(name, entry)
            }
            None => {
                warn!("Dropping '{name}': scope {scope:?} does not exist");
                None
            }
        }
    }

    /// Innermost binding of `name`, walking from `scope` out to the global scope
    pub fn power_contains(&self, scope: ScopeId, name: &str) -> Option<&Entry> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let table = self.scopes.get(id.0)?;
            if let Some(entry) = table.entries.get(name) {
                return Some(entry);
            }
            current = table.parent;
        }
        None
    }

    /// True if `name` is bound in the global scope, whatever shadows it below
    pub fn is_global(&self, scope: ScopeId, name: &str) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let Some(table) = self.scopes.get(id.0) else {
                return false;
            };
            if table.name == GLOBAL_SCOPE_NAME {
                return table.entries.contains_key(name);
            }
            current = table.parent;
        }
        false
    }

    /// Declare a function parameter in a function scope
    ///
    /// The parameter's position is its argument register: the first one
    /// declared arrives in x0.
    pub fn add_param(&mut self, scope: ScopeId, name: &str, ty: Type, vregs: &mut VRegAllocator) -> Option<VReg> {
        self.push_ordered(scope, name, ty, vregs)
    }

    /// Declare a struct field in a prototype scope
    ///
    /// The field's position is its slot in a heap instance (see
    /// [`SymbolTable::field_index`]) and the layout order every
    /// [`SymbolTable::instantiate`] copies.
    pub fn add_field(&mut self, scope: ScopeId, name: &str, ty: Type, vregs: &mut VRegAllocator) -> Option<VReg> {
        self.push_ordered(scope, name, ty, vregs)
    }

    fn push_ordered(&mut self, scope: ScopeId, name: &str, ty: Type, vregs: &mut VRegAllocator) -> Option<VReg> {
        let table = self.scopes.get_mut(scope.0)?;
        let var = VarEntry::new(ty.clone(), vregs);
        let vreg = var.vreg;
        table.param_names.push(name.to_string());
        table.param_types.push(ty);
        table.entries.insert(name.to_string(), Entry::Variable(var));
        Some(vreg)
    }

    /// Position of a field in its struct's layout
    pub fn field_index(&self, scope: ScopeId, name: &str) -> Option<usize> {
        self.scopes.get(scope.0)?
            .param_names
            .iter()
            .position(|field| field == name)
    }

    /// Variables bound in the global scope, in name order
    pub fn global_variables(&self) -> Vec<(&str, &VarEntry)> {
        self.scopes[ScopeId::GLOBAL.0]
            .entries()
            .filter_map(|(name, entry)| entry.as_variable().map(|var| (name, var)))
            .collect()
    }

    /// Build the field scope of a new instance of the struct whose layout is `proto`
    ///
    /// Every field becomes a new variable with a fresh register. Struct-typed
    /// fields are resolved from the prototype's scope chain and instantiated
    /// recursively into the field variable's own scope. The prototype is left
    /// untouched.
    pub fn instantiate(
        &mut self,
        proto: ScopeId,
        scope_name: &str,
        parent: ScopeId,
        vregs: &mut VRegAllocator,
    ) -> Result<ScopeId, SemanticError> {
        let mut in_progress = Vec::new();
        let open_scopes = self.scopes.len();
        let result = self.instantiate_nested(proto, scope_name, parent, vregs, &mut in_progress);
        if result.is_err() {
            // Drop the partially built instance scopes
            self.scopes.truncate(open_scopes);
        }
        result
    }

    fn instantiate_nested(
        &mut self,
        proto: ScopeId,
        scope_name: &str,
        parent: ScopeId,
        vregs: &mut VRegAllocator,
        in_progress: &mut Vec<String>,
    ) -> Result<ScopeId, SemanticError> {
        let prototype = self.scopes.get(proto.0).ok_or_else(|| SemanticError::NotAStruct {
            name: scope_name.to_string(),
        })?;

        if in_progress.iter().any(|name| name == &prototype.name) {
            return Err(SemanticError::RecursiveStruct {
                struct_name: prototype.name.clone(),
            });
        }
        in_progress.push(prototype.name.clone());

        // Declared fields first, in layout order, then anything else bound in the prototype
        let mut fields: Vec<(String, Type)> = prototype.param_names
            .iter()
            .filter_map(|name| match prototype.entries.get(name) {
                Some(Entry::Variable(var)) => Some((name.clone(), var.ty.clone())),
                _ => None,
            })
            .collect();
        for (name, entry) in &prototype.entries {
            if let Entry::Variable(var) = entry {
                if !prototype.param_names.contains(name) {
                    fields.push((name.clone(), var.ty.clone()));
                }
            }
        }
        let param_names = prototype.param_names.clone();
        let param_types = prototype.param_types.clone();
        // Field names may shadow their own type inside the prototype
        let type_scope = prototype.parent.unwrap_or(ScopeId::GLOBAL);

        let instance = self.push_scope(parent, scope_name);
        debug!("Instantiating {} field(s) of '{}' into scope {:?}", fields.len(), scope_name, instance);

        for (field, ty) in fields {
            let mut var = VarEntry::new(ty.clone(), vregs);
            if let Type::Struct(type_name) = &ty {
                let nested_proto = match self.power_contains(type_scope, type_name) {
                    Some(Entry::Struct(st)) => st.scope,
                    _ => {
                        return Err(SemanticError::UnknownStructType {
                            type_name: type_name.clone(),
                            field,
                        });
                    }
                };
                let nested = self.instantiate_nested(nested_proto, &field, instance, vregs, in_progress)?;
                var.fields = Some(nested);
            }
            trace!("  field '{}' -> {}", field, var.vreg);
            self.insert(instance, field, Entry::Variable(var));
        }

        if let Some(table) = self.scopes.get_mut(instance.0) {
            table.param_names = param_names;
            table.param_types = param_types;
        }

        in_progress.pop();
        Ok(instance)
    }
}
