//! Unit tests for the IR module

use super::*;
use kestrel_common::{VReg, VRegAllocator};
use pretty_assertions::assert_eq;

#[test]
fn test_new_instruction_accessors() {
    let inst = Instruction::New { target: VReg(5), type_name: "Point".to_string(), size: 2 };

    assert_eq!(inst.targets(), vec![VReg(5)]);
    assert!(inst.sources().is_empty());
    assert_eq!(inst.immediate(), None);
    assert_eq!(inst.label(), None);
    assert!(inst.is_call());
    assert_eq!(inst.to_string(), "    new r5,Point");
}

#[test]
fn test_operands_and_immediates() {
    let add = Instruction::Binary { op: BinaryOp::Add, target: VReg(3), lhs: VReg(1), rhs: Operand::Reg(VReg(2)) };
    let cmp = Instruction::Compare { cond: CompareOp::Lt, target: VReg(4), lhs: VReg(1), rhs: Operand::Imm(10) };
    let mov = Instruction::Mov { target: VReg(6), operand: Operand::Imm(-7) };

    assert_eq!(add.sources(), vec![VReg(1), VReg(2)]);
    assert_eq!(add.immediate(), None);
    assert_eq!(cmp.sources(), vec![VReg(1)]);
    assert_eq!(cmp.immediate(), Some(10));
    assert_eq!(mov.immediate(), Some(-7));

    assert_eq!(add.to_string(), "    add r3,r1,r2");
    assert_eq!(cmp.to_string(), "    cmp.lt r4,r1,#10");
    assert_eq!(mov.to_string(), "    mov r6,#-7");
}

#[test]
fn test_call_rendering() {
    let call = Instruction::Call { target: Some(VReg(9)), function: "add".to_string(), args: vec![VReg(1), VReg(2)] };
    let void = Instruction::Call { target: None, function: "log".to_string(), args: vec![] };

    assert_eq!(call.to_string(), "    call r9,add(r1,r2)");
    assert_eq!(void.to_string(), "    call log()");
    assert_eq!(call.sources(), vec![VReg(1), VReg(2)]);
    assert!(void.targets().is_empty());
}

#[test]
fn test_set_label_only_on_branches() {
    let mut branch = Instruction::Branch { label: "L1".to_string() };
    let mut cond = Instruction::CondBranch { condition: VReg(1), on_true: false, label: "L1".to_string() };
    let mut ret = Instruction::Return { value: None };

    assert!(branch.set_label("L7"));
    assert!(cond.set_label("L7"));
    assert!(!ret.set_label("L7"));

    assert_eq!(branch.label(), Some("L7"));
    assert_eq!(cond.to_string(), "    cbz r1,L7");
    assert_eq!(ret.label(), None);
}

#[test]
fn test_builder_allocates_fresh_targets() {
    let mut vregs = VRegAllocator::new();
    let mut builder = FragBuilder::new("sum", &mut vregs);

    let a = builder.param();
    let b = builder.param();
    let total = builder.binary(BinaryOp::Add, a, b);
    builder.ret(Some(total));
    let frag = builder.finish();

    assert_eq!(frag.label, "sum");
    assert_eq!(frag.params, vec![VReg(0), VReg(1)]);
    assert_eq!(frag.body, vec![
        Instruction::Binary { op: BinaryOp::Add, target: VReg(2), lhs: VReg(0), rhs: Operand::Reg(VReg(1)) },
        Instruction::Return { value: Some(VReg(2)) },
    ]);
    assert_eq!(vregs.allocated(), 3);
}

#[test]
fn test_builder_labels_are_unique() {
    let mut vregs = VRegAllocator::new();
    let mut builder = FragBuilder::new("loop", &mut vregs);

    let head = builder.fresh_label();
    let exit = builder.fresh_label();
    assert_ne!(head, exit);
    assert_eq!(head, ".Lloop_0");
}

#[test]
fn test_fragment_display() {
    let mut vregs = VRegAllocator::new();
    let mut builder = FragBuilder::new("main", &mut vregs);
    let p = builder.new_object("Point", 2);
    builder.print(p).ret(None);
    let frag = builder.finish();

    assert_eq!(frag.to_string(), "func main():\n    new r0,Point\n    print r0\n    ret\n");
}

#[test]
fn test_program_json_handoff() {
    let mut vregs = VRegAllocator::new();
    let mut builder = FragBuilder::new("main", &mut vregs);
    let flag = builder.mov(1i64);
    let skip = builder.fresh_label();
    builder.branch_if(flag, false, &skip).print(flag).label(&skip).ret(None);

    let mut program = Program::new();
    program.add_function(builder.finish());

    let text = program.to_json().unwrap();
    let back = Program::from_json(&text).unwrap();
    assert_eq!(back, program);
    assert!(back.get_function("main").is_some());
    assert!(Program::from_json("{ not json").is_err());
}
