//! A single Sheep execution: its own stack, program counter, variables and
//! pending waits.

use std::cmp::Ordering;
use std::sync::Arc;

use bevy_ecs::world::World;
use log::{debug, error};

use super::error::SheepError;
use super::instruction::{BinaryOp, Instruction, NumKind};
use super::script::SheepScript;
use super::stack::SheepStack;
use super::sysfunc::{SysFuncRegistry, WaitHandle};
use super::value::{SheepValue, ValueKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    /// Suspended by `Yield` or the instruction budget; resumes next update.
    Yielded,
    /// Blocked at an `EndWait` until every pending handle completes.
    Waiting,
    Finished,
    Failed,
}

enum Flow {
    Continue,
    Suspend(ThreadState),
    Finish,
}

#[derive(Debug)]
pub struct SheepThread {
    id: ThreadId,
    script: Arc<SheepScript>,
    function: String,
    pc: usize,
    stack: SheepStack,
    variables: Vec<SheepValue>,
    state: ThreadState,
    wait_depth: u32,
    waits: Vec<WaitHandle>,
    error: Option<SheepError>,
}

impl SheepThread {
    pub(crate) fn new(
        id: ThreadId,
        script: Arc<SheepScript>,
        function: &str,
    ) -> Result<Self, SheepError> {
        let offset = script
            .function_offset(function)
            .ok_or_else(|| SheepError::UnknownFunction(function.to_string()))?;
        let variables = script.variables.iter().map(|v| v.initial.clone()).collect();
        Ok(Self {
            id,
            script,
            function: function.to_string(),
            pc: offset as usize,
            stack: SheepStack::new(),
            variables,
            state: ThreadState::Yielded,
            wait_depth: 0,
            waits: Vec::new(),
            error: None,
        })
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn script(&self) -> &SheepScript {
        &self.script
    }

    pub fn error(&self) -> Option<&SheepError> {
        self.error.as_ref()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, ThreadState::Finished | ThreadState::Failed)
    }

    /// Current value of a script variable, looked up case-insensitively.
    pub fn variable(&self, name: &str) -> Option<&SheepValue> {
        let index = self
            .script
            .variables
            .iter()
            .position(|v| v.name.eq_ignore_ascii_case(name))?;
        self.variables.get(index)
    }

    /// Pop whatever the function left on top of the stack.
    pub(crate) fn take_result(&mut self) -> Option<SheepValue> {
        if self.stack.is_empty() {
            None
        } else {
            Some(self.stack.pop())
        }
    }

    /// Forget pending waits so the thread can continue unblocked.
    pub(crate) fn release_waits(&mut self) {
        self.waits.clear();
        if self.state == ThreadState::Waiting {
            self.state = ThreadState::Yielded;
        }
    }

    /// Execute until the thread suspends, finishes, fails, or runs `budget`
    /// instructions. A waiting thread only proceeds once all its handles are
    /// complete.
    /// Returns the number of instructions executed.
    pub(crate) fn run(&mut self, world: &mut World, sysfuncs: &SysFuncRegistry, budget: u32) -> u32 {
        match self.state {
            ThreadState::Finished | ThreadState::Failed => return 0,
            ThreadState::Waiting => {
                self.waits.retain(|w| !w.is_complete());
                if !self.waits.is_empty() {
                    return 0;
                }
            }
            _ => {}
        }

        self.state = ThreadState::Running;
        let mut executed = 0;
        while executed < budget {
            executed += 1;
            match self.step(world, sysfuncs) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Suspend(state)) => {
                    self.state = state;
                    return executed;
                }
                Ok(Flow::Finish) => {
                    debug!(
                        "Sheep thread {} finished {}:{}",
                        self.id.0, self.script.name, self.function
                    );
                    self.state = ThreadState::Finished;
                    return executed;
                }
                Err(e) => {
                    self.fail(e);
                    return executed;
                }
            }
        }
        debug!(
            "Sheep thread {} used its budget of {} instructions; yielding",
            self.id.0, budget
        );
        self.state = ThreadState::Yielded;
        executed
    }

    fn fail(&mut self, e: SheepError) {
        error!(
            "Sheep thread {} ({}:{}) failed: {}",
            self.id.0, self.script.name, self.function, e
        );
        self.error = Some(e);
        self.state = ThreadState::Failed;
    }

    fn step(&mut self, world: &mut World, sysfuncs: &SysFuncRegistry) -> Result<Flow, SheepError> {
        let script = Arc::clone(&self.script);
        let pc = self.pc;
        if pc >= script.bytecode.len() {
            return Ok(Flow::Finish);
        }
        let (instruction, next) = Instruction::decode(&script.bytecode, pc)?;
        self.pc = next;
        let strings = &script.strings;

        match instruction {
            Instruction::SitnSpin => {}
            Instruction::Yield => return Ok(Flow::Suspend(ThreadState::Yielded)),
            Instruction::CallSysFunction(ret, index) => {
                self.call_sys(world, sysfuncs, &script, pc, ret, index)?;
            }
            Instruction::Branch(target) | Instruction::BranchGoto(target) => {
                self.jump(&script, pc, target)?;
            }
            Instruction::BranchIfZero(target) => {
                if !self.stack.pop().is_truthy(strings) {
                    self.jump(&script, pc, target)?;
                }
            }
            Instruction::BeginWait => self.wait_depth += 1,
            Instruction::EndWait => {
                self.wait_depth = self.wait_depth.saturating_sub(1);
                if self.wait_depth == 0 {
                    self.waits.retain(|w| !w.is_complete());
                    if !self.waits.is_empty() {
                        return Ok(Flow::Suspend(ThreadState::Waiting));
                    }
                }
            }
            Instruction::ReturnV => return Ok(Flow::Finish),
            Instruction::Store(kind, index) => {
                let value = coerce(self.stack.pop(), kind, strings, pc, "Store")?;
                *self.variable_slot(pc, index)? = value;
            }
            Instruction::Load(kind, index) => {
                let value = self.variable_slot(pc, index)?.clone();
                let value = coerce(value, kind, strings, pc, "Load")?;
                self.stack.push(value);
            }
            Instruction::PushI(v) => self.stack.push_int(v),
            Instruction::PushF(v) => self.stack.push_float(v),
            Instruction::PushS(offset) => self.stack.push_string_offset(offset),
            Instruction::Pop(count) => self.stack.pop_n(count as usize),
            Instruction::Binary(op, kind) => {
                let b = self.stack.pop();
                let a = self.stack.pop();
                let result = binary(op, kind, &a, &b, strings, pc)?;
                self.stack.push(result);
            }
            Instruction::Negate(kind) => {
                let value = match (self.stack.pop(), kind) {
                    (SheepValue::Int(i), NumKind::Int) => SheepValue::Int(i.wrapping_neg()),
                    (SheepValue::Int(i), NumKind::Float) => SheepValue::Float(-(i as f32)),
                    (SheepValue::Float(f), _) => SheepValue::Float(-f),
                    (other, _) => return Err(mismatch(pc, "Negate", &other)),
                };
                self.stack.push(value);
            }
            Instruction::IToF => {
                let value = self.stack.pop();
                let f = value.to_float().ok_or_else(|| mismatch(pc, "IToF", &value))?;
                self.stack.push_float(f);
            }
            Instruction::FToI => {
                let value = self.stack.pop();
                let i = value.to_int().ok_or_else(|| mismatch(pc, "FToI", &value))?;
                self.stack.push_int(i);
            }
            Instruction::Modulo => {
                let b = self.stack.pop();
                let a = self.stack.pop();
                let y = b.to_int().ok_or_else(|| mismatch(pc, "Modulo", &b))?;
                let x = a.to_int().ok_or_else(|| mismatch(pc, "Modulo", &a))?;
                if y == 0 {
                    return Err(SheepError::DivideByZero { pc });
                }
                self.stack.push_int(x.wrapping_rem(y));
            }
            Instruction::And => {
                let b = self.stack.pop().is_truthy(strings);
                let a = self.stack.pop().is_truthy(strings);
                self.stack.push_int((a && b) as i32);
            }
            Instruction::Or => {
                let b = self.stack.pop().is_truthy(strings);
                let a = self.stack.pop().is_truthy(strings);
                self.stack.push_int((a || b) as i32);
            }
            Instruction::Not => {
                let a = self.stack.pop().is_truthy(strings);
                self.stack.push_int((!a) as i32);
            }
            Instruction::GetString => {
                let value = coerce(self.stack.pop(), ValueKind::String, strings, pc, "GetString")?;
                self.stack.push(value);
            }
            Instruction::DebugBreakpoint => {
                debug!(
                    "Sheep breakpoint in {}:{} at {:#06x}, stack depth {}",
                    script.name,
                    self.function,
                    pc,
                    self.stack.len()
                );
            }
        }
        Ok(Flow::Continue)
    }

    fn jump(&mut self, script: &SheepScript, pc: usize, target: u32) -> Result<(), SheepError> {
        if target as usize > script.bytecode.len() {
            return Err(SheepError::InvalidJump { pc, target });
        }
        self.pc = target as usize;
        Ok(())
    }

    fn variable_slot(&mut self, pc: usize, index: u32) -> Result<&mut SheepValue, SheepError> {
        self.variables
            .get_mut(index as usize)
            .ok_or(SheepError::BadVariable { pc, index })
    }

    /// Calling convention: arguments in order, then the argument count as an
    /// int. Exactly one value is pushed back (int 0 for void functions).
    fn call_sys(
        &mut self,
        world: &mut World,
        sysfuncs: &SysFuncRegistry,
        script: &SheepScript,
        pc: usize,
        ret: Option<ValueKind>,
        index: u32,
    ) -> Result<(), SheepError> {
        let import = script
            .imports
            .get(index as usize)
            .ok_or(SheepError::BadImport { pc, index })?;
        let func = sysfuncs
            .get(&import.name)
            .ok_or_else(|| SheepError::UnknownSysFunc(import.name.clone()))?;

        let argc = match self.stack.pop() {
            SheepValue::Int(n) => n,
            other => return Err(mismatch(pc, "CallSysFunction", &other)),
        };
        if argc < 0 || argc as usize != func.args.len() || argc as usize > self.stack.len() {
            return Err(SheepError::ArgCountMismatch {
                name: func.name.clone(),
                expected: func.args.len(),
                actual: argc,
            });
        }

        let mut raw: Vec<SheepValue> = (0..argc).map(|_| self.stack.pop()).collect();
        raw.reverse();
        let args = raw
            .into_iter()
            .zip(&func.args)
            .map(|(value, &kind)| coerce(value, kind, &script.strings, pc, "CallSysFunction"))
            .collect::<Result<Vec<_>, _>>()?;

        let result = func.call(world, &args)?;
        if let Some(handle) = result.wait
            && self.wait_depth > 0
        {
            self.waits.push(handle);
        }

        let value = match (ret, result.value) {
            (None, _) => SheepValue::Int(0),
            (Some(kind), Some(value)) => coerce(value, kind, &script.strings, pc, "CallSysFunction")?,
            (Some(ValueKind::Int), None) => SheepValue::Int(0),
            (Some(ValueKind::Float), None) => SheepValue::Float(0.0),
            (Some(ValueKind::String), None) => SheepValue::string(""),
        };
        self.stack.push(value);
        Ok(())
    }
}

fn mismatch(pc: usize, operation: &'static str, value: &SheepValue) -> SheepError {
    SheepError::TypeMismatch {
        pc,
        operation,
        found: value.kind(),
    }
}

fn resolve(value: &SheepValue, strings: &[String], pc: usize) -> Result<Arc<str>, SheepError> {
    match value {
        SheepValue::String(s) => Ok(Arc::clone(s)),
        SheepValue::StringOffset(offset) => strings
            .get(*offset as usize)
            .map(|s| Arc::from(s.as_str()))
            .ok_or(SheepError::BadStringOffset { pc, offset: *offset }),
        SheepValue::Int(i) => Ok(Arc::from(i.to_string())),
        SheepValue::Float(f) => Ok(Arc::from(f.to_string())),
    }
}

/// Convert a value to `kind`. Ints and floats convert freely (floats
/// truncate); strings never convert to or from numbers.
fn coerce(
    value: SheepValue,
    kind: ValueKind,
    strings: &[String],
    pc: usize,
    operation: &'static str,
) -> Result<SheepValue, SheepError> {
    match kind {
        ValueKind::Int => value
            .to_int()
            .map(SheepValue::Int)
            .ok_or_else(|| mismatch(pc, operation, &value)),
        ValueKind::Float => value
            .to_float()
            .map(SheepValue::Float)
            .ok_or_else(|| mismatch(pc, operation, &value)),
        ValueKind::String if value.is_string() => resolve(&value, strings, pc).map(SheepValue::String),
        ValueKind::String => Err(mismatch(pc, operation, &value)),
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

fn ordering_result(op: BinaryOp, ord: Option<Ordering>) -> SheepValue {
    let truth = match op {
        BinaryOp::IsEqual => ord == Some(Ordering::Equal),
        BinaryOp::NotEqual => ord != Some(Ordering::Equal),
        BinaryOp::IsGreater => ord == Some(Ordering::Greater),
        BinaryOp::IsLess => ord == Some(Ordering::Less),
        BinaryOp::IsGreaterEqual => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        BinaryOp::IsLessEqual => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    };
    SheepValue::Int(truth as i32)
}

fn binary(
    op: BinaryOp,
    kind: NumKind,
    a: &SheepValue,
    b: &SheepValue,
    strings: &[String],
    pc: usize,
) -> Result<SheepValue, SheepError> {
    if a.is_string() || b.is_string() {
        if op == BinaryOp::Add {
            let mut text = resolve(a, strings, pc)?.to_string();
            text.push_str(&resolve(b, strings, pc)?);
            return Ok(SheepValue::string(text));
        }
        if op.is_comparison() && a.is_string() && b.is_string() {
            let ord = compare_ignore_case(&resolve(a, strings, pc)?, &resolve(b, strings, pc)?);
            return Ok(ordering_result(op, Some(ord)));
        }
        let culprit = if a.is_string() { a } else { b };
        return Err(mismatch(pc, op.name(), culprit));
    }

    let widen = kind == NumKind::Float
        || a.kind() == ValueKind::Float
        || b.kind() == ValueKind::Float;

    if widen {
        let x = a.to_float().unwrap_or_default();
        let y = b.to_float().unwrap_or_default();
        return Ok(match op {
            BinaryOp::Add => SheepValue::Float(x + y),
            BinaryOp::Subtract => SheepValue::Float(x - y),
            BinaryOp::Multiply => SheepValue::Float(x * y),
            BinaryOp::Divide => SheepValue::Float(x / y),
            _ => ordering_result(op, x.partial_cmp(&y)),
        });
    }

    let x = a.to_int().unwrap_or_default();
    let y = b.to_int().unwrap_or_default();
    Ok(match op {
        BinaryOp::Add => SheepValue::Int(x.wrapping_add(y)),
        BinaryOp::Subtract => SheepValue::Int(x.wrapping_sub(y)),
        BinaryOp::Multiply => SheepValue::Int(x.wrapping_mul(y)),
        BinaryOp::Divide => {
            if y == 0 {
                return Err(SheepError::DivideByZero { pc });
            }
            SheepValue::Int(x.wrapping_div(y))
        }
        _ => ordering_result(op, Some(x.cmp(&y))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(
        a: SheepValue,
        b: SheepValue,
        op: BinaryOp,
        kind: NumKind,
    ) -> Result<SheepValue, SheepError> {
        binary(op, kind, &a, &b, &["Grace".to_string()], 0)
    }

    #[test]
    fn int_arithmetic_stays_int() {
        assert_eq!(eval(7.into(), 2.into(), BinaryOp::Divide, NumKind::Int), Ok(SheepValue::Int(3)));
        assert_eq!(eval(7.into(), 2.into(), BinaryOp::Subtract, NumKind::Int), Ok(SheepValue::Int(5)));
    }

    #[test]
    fn float_operand_widens() {
        assert_eq!(
            eval(7.into(), SheepValue::Float(2.0), BinaryOp::Divide, NumKind::Int),
            Ok(SheepValue::Float(3.5))
        );
        assert_eq!(
            eval(1.into(), 2.into(), BinaryOp::Add, NumKind::Float),
            Ok(SheepValue::Float(3.0))
        );
    }

    #[test]
    fn int_divide_by_zero_is_an_error() {
        assert_eq!(
            eval(1.into(), 0.into(), BinaryOp::Divide, NumKind::Int),
            Err(SheepError::DivideByZero { pc: 0 })
        );
    }

    #[test]
    fn add_concatenates_strings() {
        assert_eq!(
            eval(SheepValue::StringOffset(0), 3.into(), BinaryOp::Add, NumKind::Int),
            Ok(SheepValue::string("Grace3"))
        );
    }

    #[test]
    fn string_equality_ignores_case() {
        assert_eq!(
            eval(SheepValue::StringOffset(0), "GRACE".into(), BinaryOp::IsEqual, NumKind::Int),
            Ok(SheepValue::Int(1))
        );
        assert_eq!(
            eval("abc".into(), "ABD".into(), BinaryOp::IsLess, NumKind::Int),
            Ok(SheepValue::Int(1))
        );
    }

    #[test]
    fn strings_do_not_subtract() {
        assert!(matches!(
            eval("a".into(), 1.into(), BinaryOp::Subtract, NumKind::Int),
            Err(SheepError::TypeMismatch { found: ValueKind::String, .. })
        ));
    }

    #[test]
    fn coercion_rules() {
        let strings = vec!["x".to_string()];
        assert_eq!(coerce(SheepValue::Float(2.9), ValueKind::Int, &strings, 0, "t"), Ok(SheepValue::Int(2)));
        assert_eq!(
            coerce(SheepValue::StringOffset(0), ValueKind::String, &strings, 0, "t"),
            Ok(SheepValue::string("x"))
        );
        assert!(coerce(SheepValue::Int(1), ValueKind::String, &strings, 0, "t").is_err());
        assert_eq!(
            coerce(SheepValue::StringOffset(9), ValueKind::String, &strings, 0, "t"),
            Err(SheepError::BadStringOffset { pc: 0, offset: 9 })
        );
    }
}
