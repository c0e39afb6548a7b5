//! The bytecode container produced by codegen and consumed by the VM.
//!
//! Opcode order matches the reference `bytecode.h` exactly — it is a
//! wire-ish contract shared with `ocl-vm`, not an implementation detail
//! free to reorder.

use ocl_core::{SourceLocation, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    PushConst,
    Pop,
    LoadVar,
    StoreVar,
    LoadGlobal,
    StoreGlobal,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Not,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Jump,
    JumpIfFalse,
    JumpIfTrue,
    Call,
    Return,
    Halt,
    CallBuiltin,
    ToInt,
    ToFloat,
    ToString,
    Concat,
    ArrayNew,
    ArrayGet,
    ArraySet,
    ArrayLen,
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand1: u32,
    pub operand2: u32,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct FuncEntry {
    pub name: String,
    pub start_ip: u32,
    pub param_count: u32,
    pub local_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Value>,
    pub functions: Vec<FuncEntry>,
}

impl Bytecode {
    pub fn new() -> Self {
        Bytecode::default()
    }

    /// Append an instruction, returning its index (used as a jump-patch
    /// site by codegen).
    pub fn emit(&mut self, opcode: OpCode, operand1: u32, operand2: u32, location: SourceLocation) -> usize {
        let idx = self.instructions.len();
        self.instructions.push(Instruction { opcode, operand1, operand2, location });
        idx
    }

    /// Rewrite `operand1` of a previously emitted instruction (the
    /// forward-reference jump target). The two-pass discipline: emit a
    /// placeholder jump, keep generating code, then patch it once the
    /// real target address is known.
    pub fn patch_operand1(&mut self, index: usize, operand1: u32) {
        self.instructions[index].operand1 = operand1;
    }

    pub fn next_ip(&self) -> u32 {
        self.instructions.len() as u32
    }

    pub fn add_constant(&mut self, value: Value) -> u32 {
        self.constants.push(value);
        (self.constants.len() - 1) as u32
    }

    pub fn add_function(&mut self, entry: FuncEntry) -> u32 {
        self.functions.push(entry);
        (self.functions.len() - 1) as u32
    }

    pub fn find_function(&self, name: &str) -> Option<(u32, &FuncEntry)> {
        self.functions.iter().enumerate().find(|(_, f)| f.name == name).map(|(i, f)| (i as u32, f))
    }

    /// A disassembly listing, useful for debugging and snapshot-style
    /// tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, instr) in self.instructions.iter().enumerate() {
            out.push_str(&format!("{:>4}  {:<14?} {:>6} {:>6}\n", i, instr.opcode, instr.operand1, instr.operand2));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1, Rc::from("t.ocl"))
    }

    #[test]
    fn patch_rewrites_forward_jump() {
        let mut bc = Bytecode::new();
        let jmp = bc.emit(OpCode::Jump, 0, 0, loc());
        bc.emit(OpCode::Halt, 0, 0, loc());
        let target = bc.next_ip();
        bc.patch_operand1(jmp, target);
        assert_eq!(bc.instructions[jmp].operand1, target);
    }

    #[test]
    fn find_function_by_name() {
        let mut bc = Bytecode::new();
        bc.add_function(FuncEntry { name: "main".into(), start_ip: 0, param_count: 0, local_count: 0 });
        let (idx, entry) = bc.find_function("main").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(entry.name, "main");
        assert!(bc.find_function("missing").is_none());
    }
}
