//! Sheep bytecode: one opcode byte, optionally followed by a single
//! little-endian 32-bit operand.

use std::fmt;

use super::error::SheepError;
use super::value::ValueKind;

/// Numeric flavour of an arithmetic or comparison opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumKind {
    Int,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    IsEqual,
    NotEqual,
    IsGreater,
    IsLess,
    IsGreaterEqual,
    IsLessEqual,
}

impl BinaryOp {
    const ALL: [BinaryOp; 10] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
        BinaryOp::IsEqual,
        BinaryOp::NotEqual,
        BinaryOp::IsGreater,
        BinaryOp::IsLess,
        BinaryOp::IsGreaterEqual,
        BinaryOp::IsLessEqual,
    ];

    /// Opcode of the int variant; the float variant follows it.
    fn base_opcode(self) -> u8 {
        match self {
            BinaryOp::Add => 0x17,
            BinaryOp::Subtract => 0x19,
            BinaryOp::Multiply => 0x1B,
            BinaryOp::Divide => 0x1D,
            BinaryOp::IsEqual => 0x21,
            BinaryOp::NotEqual => 0x23,
            BinaryOp::IsGreater => 0x25,
            BinaryOp::IsLess => 0x27,
            BinaryOp::IsGreaterEqual => 0x29,
            BinaryOp::IsLessEqual => 0x2B,
        }
    }

    pub fn is_comparison(self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Subtract => "Subtract",
            BinaryOp::Multiply => "Multiply",
            BinaryOp::Divide => "Divide",
            BinaryOp::IsEqual => "IsEqual",
            BinaryOp::NotEqual => "NotEqual",
            BinaryOp::IsGreater => "IsGreater",
            BinaryOp::IsLess => "IsLess",
            BinaryOp::IsGreaterEqual => "IsGreaterEqual",
            BinaryOp::IsLessEqual => "IsLessEqual",
        }
    }
}

/// A decoded instruction.
///
/// Typed opcode families (`StoreI/F/S`, `AddI/AddF`, ...) are folded into one
/// variant carrying the type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    SitnSpin,
    Yield,
    /// Return type (`None` for void) and import index.
    CallSysFunction(Option<ValueKind>, u32),
    Branch(u32),
    BranchGoto(u32),
    BranchIfZero(u32),
    BeginWait,
    EndWait,
    ReturnV,
    Store(ValueKind, u32),
    Load(ValueKind, u32),
    PushI(i32),
    PushF(f32),
    PushS(u32),
    Pop(u32),
    Binary(BinaryOp, NumKind),
    Negate(NumKind),
    IToF,
    FToI,
    Modulo,
    And,
    Or,
    Not,
    GetString,
    DebugBreakpoint,
}

fn kind_offset(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::Int => 0,
        ValueKind::Float => 1,
        ValueKind::String => 2,
    }
}

fn kind_at(offset: u8) -> ValueKind {
    match offset {
        0 => ValueKind::Int,
        1 => ValueKind::Float,
        _ => ValueKind::String,
    }
}

fn num_offset(kind: NumKind) -> u8 {
    match kind {
        NumKind::Int => 0,
        NumKind::Float => 1,
    }
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match *self {
            Instruction::SitnSpin => 0x00,
            Instruction::Yield => 0x01,
            Instruction::CallSysFunction(None, _) => 0x02,
            Instruction::CallSysFunction(Some(kind), _) => 0x03 + kind_offset(kind),
            Instruction::Branch(_) => 0x06,
            Instruction::BranchGoto(_) => 0x07,
            Instruction::BranchIfZero(_) => 0x08,
            Instruction::BeginWait => 0x09,
            Instruction::EndWait => 0x0A,
            Instruction::ReturnV => 0x0B,
            Instruction::Store(kind, _) => 0x0D + kind_offset(kind),
            Instruction::Load(kind, _) => 0x10 + kind_offset(kind),
            Instruction::PushI(_) => 0x13,
            Instruction::PushF(_) => 0x14,
            Instruction::PushS(_) => 0x15,
            Instruction::Pop(_) => 0x16,
            Instruction::Binary(op, kind) => op.base_opcode() + num_offset(kind),
            Instruction::Negate(kind) => 0x1F + num_offset(kind),
            Instruction::IToF => 0x2D,
            Instruction::FToI => 0x2E,
            Instruction::Modulo => 0x2F,
            Instruction::And => 0x30,
            Instruction::Or => 0x31,
            Instruction::Not => 0x32,
            Instruction::GetString => 0x33,
            Instruction::DebugBreakpoint => 0x34,
        }
    }

    /// Raw operand bits, if the instruction carries one.
    fn operand(&self) -> Option<[u8; 4]> {
        match *self {
            Instruction::CallSysFunction(_, v)
            | Instruction::Branch(v)
            | Instruction::BranchGoto(v)
            | Instruction::BranchIfZero(v)
            | Instruction::Store(_, v)
            | Instruction::Load(_, v)
            | Instruction::PushS(v)
            | Instruction::Pop(v) => Some(v.to_le_bytes()),
            Instruction::PushI(v) => Some(v.to_le_bytes()),
            Instruction::PushF(v) => Some(v.to_le_bytes()),
            _ => None,
        }
    }

    /// Encoded length in bytes.
    pub fn size(&self) -> usize {
        if self.operand().is_some() { 5 } else { 1 }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode());
        if let Some(bytes) = self.operand() {
            out.extend_from_slice(&bytes);
        }
    }

    /// Decode the instruction at `pc`, returning it and the next pc.
    pub fn decode(bytecode: &[u8], pc: usize) -> Result<(Instruction, usize), SheepError> {
        let Some(&opcode) = bytecode.get(pc) else {
            return Err(SheepError::TruncatedInstruction { pc });
        };
        let operand = || -> Result<[u8; 4], SheepError> {
            bytecode
                .get(pc + 1..pc + 5)
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or(SheepError::TruncatedInstruction { pc })
        };
        let u = || operand().map(u32::from_le_bytes);

        let instruction = match opcode {
            0x00 => Instruction::SitnSpin,
            0x01 => Instruction::Yield,
            0x02 => Instruction::CallSysFunction(None, u()?),
            0x03..=0x05 => Instruction::CallSysFunction(Some(kind_at(opcode - 0x03)), u()?),
            0x06 => Instruction::Branch(u()?),
            0x07 => Instruction::BranchGoto(u()?),
            0x08 => Instruction::BranchIfZero(u()?),
            0x09 => Instruction::BeginWait,
            0x0A => Instruction::EndWait,
            0x0B => Instruction::ReturnV,
            0x0D..=0x0F => Instruction::Store(kind_at(opcode - 0x0D), u()?),
            0x10..=0x12 => Instruction::Load(kind_at(opcode - 0x10), u()?),
            0x13 => Instruction::PushI(i32::from_le_bytes(operand()?)),
            0x14 => Instruction::PushF(f32::from_le_bytes(operand()?)),
            0x15 => Instruction::PushS(u()?),
            0x16 => Instruction::Pop(u()?),
            0x1F => Instruction::Negate(NumKind::Int),
            0x20 => Instruction::Negate(NumKind::Float),
            0x2D => Instruction::IToF,
            0x2E => Instruction::FToI,
            0x2F => Instruction::Modulo,
            0x30 => Instruction::And,
            0x31 => Instruction::Or,
            0x32 => Instruction::Not,
            0x33 => Instruction::GetString,
            0x34 => Instruction::DebugBreakpoint,
            _ => BinaryOp::ALL
                .iter()
                .find_map(|&op| {
                    let base = op.base_opcode();
                    if opcode == base {
                        Some(Instruction::Binary(op, NumKind::Int))
                    } else if opcode == base + 1 {
                        Some(Instruction::Binary(op, NumKind::Float))
                    } else {
                        None
                    }
                })
                .ok_or(SheepError::UnknownOpcode { pc, opcode })?,
        };
        let next = pc + instruction.size();
        Ok((instruction, next))
    }
}

fn suffix(kind: ValueKind) -> char {
    match kind {
        ValueKind::Int => 'I',
        ValueKind::Float => 'F',
        ValueKind::String => 'S',
    }
}

fn num_suffix(kind: NumKind) -> char {
    match kind {
        NumKind::Int => 'I',
        NumKind::Float => 'F',
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::SitnSpin => write!(f, "SitnSpin"),
            Instruction::Yield => write!(f, "Yield"),
            Instruction::CallSysFunction(None, import) => write!(f, "CallSysFunctionV {}", import),
            Instruction::CallSysFunction(Some(kind), import) => {
                write!(f, "CallSysFunction{} {}", suffix(kind), import)
            }
            Instruction::Branch(target) => write!(f, "Branch {:#06x}", target),
            Instruction::BranchGoto(target) => write!(f, "BranchGoto {:#06x}", target),
            Instruction::BranchIfZero(target) => write!(f, "BranchIfZero {:#06x}", target),
            Instruction::BeginWait => write!(f, "BeginWait"),
            Instruction::EndWait => write!(f, "EndWait"),
            Instruction::ReturnV => write!(f, "ReturnV"),
            Instruction::Store(kind, var) => write!(f, "Store{} {}", suffix(kind), var),
            Instruction::Load(kind, var) => write!(f, "Load{} {}", suffix(kind), var),
            Instruction::PushI(v) => write!(f, "PushI {}", v),
            Instruction::PushF(v) => write!(f, "PushF {}", v),
            Instruction::PushS(offset) => write!(f, "PushS {}", offset),
            Instruction::Pop(n) => write!(f, "Pop {}", n),
            Instruction::Binary(op, kind) => write!(f, "{}{}", op.name(), num_suffix(kind)),
            Instruction::Negate(kind) => write!(f, "Negate{}", num_suffix(kind)),
            Instruction::IToF => write!(f, "IToF"),
            Instruction::FToI => write!(f, "FToI"),
            Instruction::Modulo => write!(f, "Modulo"),
            Instruction::And => write!(f, "And"),
            Instruction::Or => write!(f, "Or"),
            Instruction::Not => write!(f, "Not"),
            Instruction::GetString => write!(f, "GetString"),
            Instruction::DebugBreakpoint => write!(f, "DebugBreakpoint"),
        }
    }
}
