//! Compiled Sheep scripts and a small assembler for building them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::SheepError;
use super::instruction::Instruction;
use super::value::{SheepValue, ValueKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheepVariable {
    pub name: String,
    pub initial: SheepValue,
}

impl SheepVariable {
    pub fn kind(&self) -> ValueKind {
        self.initial.kind()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheepFunction {
    pub name: String,
    pub offset: u32,
}

/// A system function the script calls, resolved by name at call time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysImport {
    pub name: String,
    pub arg_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SheepScript {
    pub name: String,
    #[serde(default)]
    pub strings: Vec<String>,
    #[serde(default)]
    pub variables: Vec<SheepVariable>,
    #[serde(default)]
    pub functions: Vec<SheepFunction>,
    #[serde(default)]
    pub imports: Vec<SysImport>,
    pub bytecode: Vec<u8>,
}

impl SheepScript {
    /// Bytecode offset of a function; names are case-insensitive.
    pub fn function_offset(&self, name: &str) -> Option<u32> {
        self.functions
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.offset)
    }

    pub fn string(&self, offset: u32) -> Option<&str> {
        self.strings.get(offset as usize).map(String::as_str)
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid script JSON: {}", e))
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize script: {}", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }

    /// Render the whole script as text: tables first, then one line per
    /// instruction with function entry points marked.
    pub fn disassemble(&self) -> Result<String, SheepError> {
        let mut out = String::new();
        out.push_str(&format!("; script {}\n", self.name));
        for (i, s) in self.strings.iter().enumerate() {
            out.push_str(&format!("; string {:>3}: {:?}\n", i, s));
        }
        for (i, v) in self.variables.iter().enumerate() {
            out.push_str(&format!("; var    {:>3}: {} {} = {}\n", i, v.kind(), v.name, v.initial));
        }
        for (i, import) in self.imports.iter().enumerate() {
            out.push_str(&format!("; import {:>3}: {}/{}\n", i, import.name, import.arg_count));
        }

        let mut pc = 0;
        while pc < self.bytecode.len() {
            for f in self.functions.iter().filter(|f| f.offset as usize == pc) {
                out.push_str(&format!("{}:\n", f.name));
            }
            let (instruction, next) = Instruction::decode(&self.bytecode, pc)?;
            out.push_str(&format!("  {:#06x}  {}", pc, instruction));
            match instruction {
                Instruction::PushS(offset) => {
                    if let Some(s) = self.string(offset) {
                        out.push_str(&format!("  ; {:?}", s));
                    }
                }
                Instruction::CallSysFunction(_, index) => {
                    if let Some(import) = self.imports.get(index as usize) {
                        out.push_str(&format!("  ; {}", import.name));
                    }
                }
                Instruction::Store(_, index) | Instruction::Load(_, index) => {
                    if let Some(var) = self.variables.get(index as usize) {
                        out.push_str(&format!("  ; {}", var.name));
                    }
                }
                _ => {}
            }
            out.push('\n');
            pc = next;
        }
        Ok(out)
    }
}

/// Forward-referenceable jump target handed out by [`ScriptBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label(usize);

/// Assembles a [`SheepScript`] instruction by instruction.
///
/// Jumps take [`Label`]s, which may be bound before or after the jump is
/// emitted; operands are patched in [`ScriptBuilder::build`].
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    script: SheepScript,
    labels: Vec<Option<u32>>,
    fixups: Vec<(usize, Label)>,
}

impl ScriptBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            script: SheepScript {
                name: name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Current bytecode offset.
    pub fn offset(&self) -> u32 {
        self.script.bytecode.len() as u32
    }

    /// Intern a string constant and return its offset.
    pub fn string(&mut self, text: &str) -> u32 {
        if let Some(i) = self.script.strings.iter().position(|s| s == text) {
            return i as u32;
        }
        self.script.strings.push(text.to_string());
        (self.script.strings.len() - 1) as u32
    }

    /// Declare a variable; its type is the type of `initial`.
    pub fn variable(&mut self, name: &str, initial: impl Into<SheepValue>) -> u32 {
        self.script.variables.push(SheepVariable {
            name: name.to_string(),
            initial: initial.into(),
        });
        (self.script.variables.len() - 1) as u32
    }

    pub fn import(&mut self, name: &str, arg_count: u32) -> u32 {
        if let Some(i) = self
            .script
            .imports
            .iter()
            .position(|imp| imp.name.eq_ignore_ascii_case(name) && imp.arg_count == arg_count)
        {
            return i as u32;
        }
        self.script.imports.push(SysImport {
            name: name.to_string(),
            arg_count,
        });
        (self.script.imports.len() - 1) as u32
    }

    /// Start a function at the current offset.
    pub fn function(&mut self, name: &str) -> &mut Self {
        let offset = self.offset();
        self.script.functions.push(SheepFunction {
            name: name.to_string(),
            offset,
        });
        self
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the current offset. Labels from another builder
    /// are ignored and reported by [`ScriptBuilder::build`].
    pub fn bind(&mut self, label: Label) -> &mut Self {
        let offset = self.offset();
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = Some(offset);
        }
        self
    }

    pub fn emit(&mut self, instruction: Instruction) -> &mut Self {
        instruction.encode(&mut self.script.bytecode);
        self
    }

    fn emit_jump(&mut self, instruction: Instruction, label: Label) -> &mut Self {
        self.fixups.push((self.script.bytecode.len() + 1, label));
        self.emit(instruction)
    }

    pub fn branch(&mut self, label: Label) -> &mut Self {
        self.emit_jump(Instruction::Branch(0), label)
    }

    pub fn branch_goto(&mut self, label: Label) -> &mut Self {
        self.emit_jump(Instruction::BranchGoto(0), label)
    }

    pub fn branch_if_zero(&mut self, label: Label) -> &mut Self {
        self.emit_jump(Instruction::BranchIfZero(0), label)
    }

    pub fn push_int(&mut self, value: i32) -> &mut Self {
        self.emit(Instruction::PushI(value))
    }

    pub fn push_float(&mut self, value: f32) -> &mut Self {
        self.emit(Instruction::PushF(value))
    }

    /// Push a string constant (as an offset) followed by `GetString`.
    pub fn push_str(&mut self, text: &str) -> &mut Self {
        let offset = self.string(text);
        self.emit(Instruction::PushS(offset))
            .emit(Instruction::GetString)
    }

    /// Call a system function whose `arg_count` arguments are already on
    /// the stack. Emits the argument-count push and the typed call; for void
    /// functions the placeholder result is popped again.
    pub fn call(&mut self, name: &str, arg_count: u32, ret: Option<ValueKind>) -> &mut Self {
        let import = self.import(name, arg_count);
        self.emit(Instruction::PushI(arg_count as i32))
            .emit(Instruction::CallSysFunction(ret, import));
        if ret.is_none() {
            self.emit(Instruction::Pop(1));
        }
        self
    }

    pub fn build(mut self) -> Result<SheepScript, SheepError> {
        for (at, label) in std::mem::take(&mut self.fixups) {
            let target = self
                .labels
                .get(label.0)
                .copied()
                .flatten()
                .ok_or(SheepError::UnboundLabel(label.0))?;
            self.script.bytecode[at..at + 4].copy_from_slice(&target.to_le_bytes());
        }
        Ok(self.script)
    }
}
