use std::error::Error;
use std::fmt;

use super::value::ValueKind;

/// Recoverable script failure. The thread that raised it stops; the VM and
/// every other thread carry on.
#[derive(Debug, Clone, PartialEq)]
pub enum SheepError {
    UnknownOpcode { pc: usize, opcode: u8 },
    TruncatedInstruction { pc: usize },
    InvalidJump { pc: usize, target: u32 },
    UnknownFunction(String),
    UnknownSysFunc(String),
    BadImport { pc: usize, index: u32 },
    ArgCountMismatch { name: String, expected: usize, actual: i32 },
    TypeMismatch { pc: usize, operation: &'static str, found: ValueKind },
    DivideByZero { pc: usize },
    BadVariable { pc: usize, index: u32 },
    BadStringOffset { pc: usize, offset: u32 },
    UnboundLabel(usize),
    BudgetExceeded { function: String, budget: u32 },
    Host { name: String, message: String },
}

impl fmt::Display for SheepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheepError::UnknownOpcode { pc, opcode } => {
                write!(f, "unknown opcode 0x{:02X} at {:#06x}", opcode, pc)
            }
            SheepError::TruncatedInstruction { pc } => {
                write!(f, "instruction at {:#06x} runs past the end of the bytecode", pc)
            }
            SheepError::InvalidJump { pc, target } => {
                write!(f, "jump at {:#06x} targets {:#06x}, outside the bytecode", pc, target)
            }
            SheepError::UnknownFunction(name) => write!(f, "no function named '{}'", name),
            SheepError::UnknownSysFunc(name) => {
                write!(f, "no system function named '{}'", name)
            }
            SheepError::BadImport { pc, index } => {
                write!(f, "call at {:#06x} uses missing import #{}", pc, index)
            }
            SheepError::ArgCountMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "'{}' takes {} argument(s), called with {}",
                name, expected, actual
            ),
            SheepError::TypeMismatch { pc, operation, found } => {
                write!(f, "{} at {:#06x} cannot take a {} operand", operation, pc, found)
            }
            SheepError::DivideByZero { pc } => write!(f, "integer division by zero at {:#06x}", pc),
            SheepError::BadVariable { pc, index } => {
                write!(f, "variable #{} at {:#06x} does not exist", index, pc)
            }
            SheepError::BadStringOffset { pc, offset } => {
                write!(f, "string offset {} at {:#06x} is outside the string table", offset, pc)
            }
            SheepError::UnboundLabel(label) => write!(f, "label #{} was never bound", label),
            SheepError::BudgetExceeded { function, budget } => {
                write!(f, "{} did not finish within {} instructions", function, budget)
            }
            SheepError::Host { name, message } => write!(f, "{} failed: {}", name, message),
        }
    }
}

impl Error for SheepError {}
