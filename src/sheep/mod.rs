//! Sheep: the engine's scripting virtual machine.
//!
//! Scripts are compiled offline into a [`SheepScript`] (bytecode plus string,
//! variable, function and import tables). Each execution runs on its own
//! [`SheepThread`] with a private operand [`SheepStack`]; the [`SheepVm`]
//! schedules threads cooperatively once per frame and dispatches
//! `CallSysFunction` to host callbacks registered in a [`SysFuncRegistry`].
//!
//! # Example
//!
//! ```ignore
//! let mut b = ScriptBuilder::new("hello");
//! b.function("main").push_str("Hello").call("PrintString", 1, None);
//! let script = Arc::new(b.build()?);
//! vm.start(&mut world, script, "main")?;
//! ```

pub mod builtins;
pub mod error;
pub mod instruction;
pub mod script;
pub mod stack;
pub mod sysfunc;
pub mod thread;
pub mod value;
pub mod vm;

pub use error::SheepError;
pub use instruction::{BinaryOp, Instruction, NumKind};
pub use script::{Label, ScriptBuilder, SheepScript};
pub use stack::SheepStack;
pub use sysfunc::{SysFuncRegistry, SysReturn, WaitHandle};
pub use thread::{SheepThread, ThreadId, ThreadState};
pub use value::{SheepValue, ValueKind};
pub use vm::SheepVm;
