//! Drives the [`SheepVm`] resource.

use bevy_ecs::prelude::*;

use crate::sheep::vm::SheepVm;

/// Resume every script thread that can make progress.
///
/// The VM is lifted out of the world for the duration, so system functions
/// get unrestricted `&mut World` access. Does nothing without a VM resource.
pub fn run_sheep_threads(world: &mut World) {
    if !world.contains_resource::<SheepVm>() {
        return;
    }
    world.resource_scope(|world, mut vm: Mut<SheepVm>| vm.update(world));
}
