//! Host ("system") functions callable from Sheep bytecode.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::world::World;
use rustc_hash::FxHashMap;

use super::error::SheepError;
use super::value::{SheepValue, ValueKind};

/// Completion flag shared between a long-running host action and the script
/// thread waiting on it.
#[derive(Clone, Debug, Default)]
pub struct WaitHandle(Arc<AtomicBool>);

impl WaitHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What a host function hands back to the VM.
#[derive(Clone, Debug, Default)]
pub struct SysReturn {
    pub value: Option<SheepValue>,
    pub wait: Option<WaitHandle>,
}

impl SysReturn {
    pub fn void() -> Self {
        Self::default()
    }

    pub fn int(value: i32) -> Self {
        Self {
            value: Some(SheepValue::Int(value)),
            wait: None,
        }
    }

    pub fn float(value: f32) -> Self {
        Self {
            value: Some(SheepValue::Float(value)),
            wait: None,
        }
    }

    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: Some(SheepValue::String(value.into())),
            wait: None,
        }
    }

    /// Void result that a surrounding wait block should block on.
    pub fn waiting(handle: WaitHandle) -> Self {
        Self {
            value: None,
            wait: Some(handle),
        }
    }
}

pub type SysCallback =
    dyn Fn(&mut World, &[SheepValue]) -> Result<SysReturn, SheepError> + Send + Sync;

pub struct SysFunc {
    pub name: String,
    pub args: Vec<ValueKind>,
    pub ret: Option<ValueKind>,
    callback: Box<SysCallback>,
}

impl SysFunc {
    /// Arguments arrive already coerced to `self.args` with string offsets
    /// resolved.
    pub fn call(&self, world: &mut World, args: &[SheepValue]) -> Result<SysReturn, SheepError> {
        (self.callback)(world, args)
    }
}

impl fmt::Debug for SysFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SysFunc")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("ret", &self.ret)
            .finish_non_exhaustive()
    }
}

/// Name-indexed table of host functions. Lookups ignore case.
#[derive(Debug, Default)]
pub struct SysFuncRegistry {
    funcs: FxHashMap<String, SysFunc>,
}

impl SysFuncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the engine's built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::builtins::register_builtins(&mut registry);
        registry
    }

    /// Register (or replace) a function.
    pub fn register<F>(&mut self, name: &str, args: &[ValueKind], ret: Option<ValueKind>, callback: F)
    where
        F: Fn(&mut World, &[SheepValue]) -> Result<SysReturn, SheepError> + Send + Sync + 'static,
    {
        let key = name.to_ascii_lowercase();
        if self.funcs.contains_key(&key) {
            log::debug!("Replacing system function {}", name);
        }
        self.funcs.insert(
            key,
            SysFunc {
                name: name.to_string(),
                args: args.to_vec(),
                ret,
                callback: Box::new(callback),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&SysFunc> {
        self.funcs.get(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}
