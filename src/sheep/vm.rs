//! Cooperative scheduler for Sheep threads.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::debug;

use super::error::SheepError;
use super::script::SheepScript;
use super::sysfunc::SysFuncRegistry;
use super::thread::{SheepThread, ThreadId, ThreadState};
use super::value::SheepValue;
use crate::resources::engineconfig::EngineConfig;

pub const DEFAULT_INSTRUCTION_BUDGET: u32 = 100_000;

/// Owns every live script thread and the host functions they may call.
///
/// Stored as a resource and driven once per frame by
/// [`run_sheep_threads`](crate::systems::sheep::run_sheep_threads).
/// Threads that finished or failed stay inspectable until the next
/// [`SheepVm::update`].
#[derive(Resource, Debug)]
pub struct SheepVm {
    sysfuncs: SysFuncRegistry,
    threads: Vec<SheepThread>,
    instruction_budget: u32,
    next_id: u32,
}

impl Default for SheepVm {
    fn default() -> Self {
        Self::new(SysFuncRegistry::with_builtins())
    }
}

impl SheepVm {
    pub fn new(sysfuncs: SysFuncRegistry) -> Self {
        Self {
            sysfuncs,
            threads: Vec::new(),
            instruction_budget: DEFAULT_INSTRUCTION_BUDGET,
            next_id: 1,
        }
    }

    /// Built-in functions and the configured instruction budget.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::default().with_instruction_budget(config.instruction_budget)
    }

    pub fn with_instruction_budget(mut self, budget: u32) -> Self {
        self.instruction_budget = budget.max(1);
        self
    }

    pub fn instruction_budget(&self) -> u32 {
        self.instruction_budget
    }

    pub fn sysfuncs(&self) -> &SysFuncRegistry {
        &self.sysfuncs
    }

    pub fn sysfuncs_mut(&mut self) -> &mut SysFuncRegistry {
        &mut self.sysfuncs
    }

    /// Start `function` on a new thread and run it until it first suspends.
    pub fn start(
        &mut self,
        world: &mut World,
        script: Arc<SheepScript>,
        function: &str,
    ) -> Result<ThreadId, SheepError> {
        let id = ThreadId(self.next_id);
        let mut thread = SheepThread::new(id, script, function)?;
        self.next_id += 1;
        debug!(
            "Starting Sheep thread {} at {}:{}",
            id.0,
            thread.script().name,
            function
        );
        thread.run(world, &self.sysfuncs, self.instruction_budget);
        self.threads.push(thread);
        Ok(id)
    }

    /// Run `function` to completion right now and return the value it left
    /// on the stack (int 0 if none). Yields are ignored and waits do not
    /// block. The whole call may run at most `instruction_budget`
    /// instructions; past that it fails with [`SheepError::BudgetExceeded`].
    pub fn evaluate(
        &mut self,
        world: &mut World,
        script: Arc<SheepScript>,
        function: &str,
    ) -> Result<SheepValue, SheepError> {
        let mut thread = SheepThread::new(ThreadId(0), script, function)?;
        let mut remaining = self.instruction_budget;
        loop {
            remaining -= thread.run(world, &self.sysfuncs, remaining);
            match thread.state() {
                ThreadState::Finished => return Ok(thread.take_result().unwrap_or_default()),
                ThreadState::Failed => {
                    return Err(thread
                        .error()
                        .cloned()
                        .unwrap_or_else(|| SheepError::UnknownFunction(function.to_string())));
                }
                ThreadState::Waiting => thread.release_waits(),
                ThreadState::Running | ThreadState::Yielded => {}
            }
            if remaining == 0 {
                return Err(SheepError::BudgetExceeded {
                    function: function.to_string(),
                    budget: self.instruction_budget,
                });
            }
        }
    }

    /// Drop threads that ended last update, then resume every thread that
    /// can make progress.
    pub fn update(&mut self, world: &mut World) {
        self.threads.retain(|t| !t.is_done());
        for thread in &mut self.threads {
            thread.run(world, &self.sysfuncs, self.instruction_budget);
        }
    }

    pub fn thread(&self, id: ThreadId) -> Option<&SheepThread> {
        self.threads.iter().find(|t| t.id() == id)
    }

    pub fn thread_state(&self, id: ThreadId) -> Option<ThreadState> {
        self.thread(id).map(SheepThread::state)
    }

    /// Abandon a thread without running it further.
    pub fn stop(&mut self, id: ThreadId) -> bool {
        let before = self.threads.len();
        self.threads.retain(|t| t.id() != id);
        self.threads.len() != before
    }

    /// Threads that have not finished or failed.
    pub fn live_count(&self) -> usize {
        self.threads.iter().filter(|t| !t.is_done()).count()
    }

    pub fn is_idle(&self) -> bool {
        self.live_count() == 0
    }
}
