//! Tests for struct prototypes feeding IR generation

use kestrel_common::{Type, VRegAllocator};
use kestrel_frontend::ir::Instruction;
use kestrel_frontend::{Entry, FragBuilder, ScopeId, StructEntry, SymbolTable, VarEntry};

/// Declare `struct Point { x: int, y: int, next: Point* }` in the global scope
fn declare_point(symbols: &mut SymbolTable, vregs: &mut VRegAllocator) -> ScopeId {
    let proto = symbols.push_scope(ScopeId::GLOBAL, "Point");
    symbols.add_field(proto, "x", Type::Int, vregs);
    symbols.add_field(proto, "y", Type::Int, vregs);
    symbols.add_field(proto, "next", Type::Pointer(Box::new(Type::Struct("Point".to_string()))), vregs);
    let entry = StructEntry::new("Point", proto, vregs);
    symbols.insert(ScopeId::GLOBAL, "Point", Entry::Struct(entry));
    proto
}

#[test]
fn test_field_indices_follow_declaration_order() {
    let mut symbols = SymbolTable::new();
    let mut vregs = VRegAllocator::new();
    let proto = declare_point(&mut symbols, &mut vregs);

    assert_eq!(symbols.field_index(proto, "x"), Some(0));
    assert_eq!(symbols.field_index(proto, "y"), Some(1));
    assert_eq!(symbols.field_index(proto, "next"), Some(2));
    assert_eq!(symbols.field_index(proto, "z"), None);
}

#[test]
fn test_field_access_through_heap_instance() {
    let mut symbols = SymbolTable::new();
    let mut vregs = VRegAllocator::new();
    let proto = declare_point(&mut symbols, &mut vregs);
    let fields = symbols.scope(proto).map(|s| s.param_names().len()).unwrap_or(0);
    let y_index = symbols.field_index(proto, "y").unwrap();

    let main_scope = symbols.push_scope(ScopeId::GLOBAL, "main");
    let p = VarEntry::new(Type::Struct("Point".to_string()), &mut vregs);
    let p_reg = p.vreg;
    symbols.insert(main_scope, "p", Entry::Variable(p));

    let mut b = FragBuilder::new("main", &mut vregs);
    b.alloc_into(p_reg, "Point", fields);
    let five = b.mov(5i64);
    b.store_field(five, p_reg, "y", y_index);
    let y = b.load_field(p_reg, "y", y_index);
    b.print(y).delete(p_reg).ret(None);
    let frag = b.finish();

    assert_eq!(frag.body[0], Instruction::New { target: p_reg, type_name: "Point".to_string(), size: 3 });
    assert_eq!(frag.body[2].to_string(), format!("    stf {},{}.y", five, p_reg));
    assert_eq!(frag.body[3], Instruction::LoadField { target: y, base: p_reg, field: "y".to_string(), index: 1 });
}

#[test]
fn test_instances_resolve_through_scope_chain() {
    let mut symbols = SymbolTable::new();
    let mut vregs = VRegAllocator::new();
    let proto = declare_point(&mut symbols, &mut vregs);

    let main_scope = symbols.push_scope(ScopeId::GLOBAL, "main");
    let block = symbols.push_scope(main_scope, "block");
    let instance = symbols.instantiate(proto, "origin", block, &mut vregs).unwrap();

    let mut origin = VarEntry::new(Type::Struct("Point".to_string()), &mut vregs);
    origin.fields = Some(instance);
    symbols.insert(block, "origin", Entry::Variable(origin));

    assert!(symbols.power_contains(block, "Point").is_some());
    assert!(symbols.contains(main_scope, "origin").is_none());
    assert_eq!(symbols.scope(instance).map(|s| s.parent()), Some(Some(block)));
    assert_eq!(
        symbols.contains(instance, "next").and_then(|e| e.as_variable()).map(|v| v.ty.is_scalar()),
        Some(true)
    );
}
