//! gengine command-line front end.
//!
//! - `run <script.json>` builds a small demo scene (a listener actor with a
//!   child, and a HUD rect with an action bar), runs one Sheep function on it
//!   frame by frame until every script thread ends, then logs where the
//!   actors ended up.
//! - `disasm <script.json>` prints a bytecode listing.
//!
//! Scripts are the JSON form of [`SheepScript`].
//!
//! # Running
//!
//! ```sh
//! cargo run -- run demos/walk.json --frames 300
//! RUST_LOG=debug cargo run -- disasm demos/walk.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use gengine::components::audiolistener::AudioListener;
use gengine::components::recttransform::RectTransform;
use gengine::math::{Vec2, Vec3};
use gengine::resources::engineconfig::EngineConfig;
use gengine::resources::listenerpose::ListenerPose;
use gengine::scene::Scene;
use gengine::scene::actor_ops::{ActorBuilder, ActorOps};
use gengine::scene::rect_ops::RectTransformOps;
use gengine::scene::transform_ops::TransformOps;
use gengine::sheep::{SheepScript, SheepVm};

#[derive(Parser)]
#[command(version, about = "Scene graph and Sheep script runner")]
struct Cli {
    /// Engine configuration file (INI). Defaults are used if it is missing.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script function against the demo scene.
    Run {
        /// Compiled script (JSON).
        script: PathBuf,
        /// Function to start.
        #[arg(long, default_value = "main")]
        function: String,
        /// Stop after this many frames even if threads are still running.
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Seconds per frame.
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
    },
    /// Print a bytecode listing.
    Disasm {
        /// Compiled script (JSON).
        script: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run {
            script,
            function,
            frames,
            dt,
        } => run(&cli.config, &script, &function, frames, dt),
        Command::Disasm { script } => disasm(&script),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> EngineConfig {
    let mut config = EngineConfig::with_path(path);
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    config
}

fn build_demo_scene(scene: &mut Scene) {
    let gabriel = scene.spawn_actor(ActorBuilder::new("Gabriel"));
    scene.add_actor_component(gabriel, AudioListener);
    scene.spawn_actor(
        ActorBuilder::new("Grace")
            .with_parent(gabriel)
            .with_position(Vec3::new(2.0, 0.0, 0.0)),
    );

    let hud = scene.spawn_actor(ActorBuilder::new("Hud").with_rect(RectTransform::stretched()));
    scene.spawn_actor(
        ActorBuilder::new("ActionBar").with_parent(hud).with_rect(
            RectTransform::default()
                .with_anchors(Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0))
                .with_pivot(Vec2::new(0.5, 1.0))
                .with_size_delta(Vec2::new(0.0, 200.0)),
        ),
    );
}

fn run(config: &Path, script: &Path, function: &str, frames: u32, dt: f32) -> Result<(), String> {
    let config = load_config(config);
    let script = Arc::new(SheepScript::load(script)?);

    let mut scene = Scene::new(config.clone());
    build_demo_scene(&mut scene);

    let mut vm = SheepVm::from_config(&config);
    vm.start(scene.world_mut(), script, function)
        .map_err(|e| e.to_string())?;
    scene.insert_resource(vm);

    let mut frame = 0;
    while frame < frames && !scene.resource::<SheepVm>().is_idle() {
        scene.update(dt);
        frame += 1;
    }
    if !scene.resource::<SheepVm>().is_idle() {
        warn!("Stopped after {} frames with script threads still running", frames);
    }
    info!("Ran {} frame(s)", frame);

    for actor in scene.actors() {
        let name = scene.actor(actor).map(|a| a.name().to_string()).unwrap_or_default();
        let active = scene.is_active(actor);
        if let Some(rect) = scene.world_rect(actor) {
            info!("{:<10} active={} rect={:?}", name, active, rect);
        } else if let Some(position) = scene.world_position(actor) {
            info!("{:<10} active={} position={}", name, active, position);
        }
    }
    let pose = *scene.resource::<ListenerPose>();
    info!("Listener at {} facing {}", pose.position, pose.rotation * Vec3::Z);
    Ok(())
}

fn disasm(script: &Path) -> Result<(), String> {
    let script = SheepScript::load(script)?;
    let listing = script.disassemble().map_err(|e| e.to_string())?;
    print!("{}", listing);
    Ok(())
}
