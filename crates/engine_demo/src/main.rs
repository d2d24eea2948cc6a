//! # engine_demo
//!
//! Drives a small particle simulation through `engine_ecs`:
//!
//! 1. Load the world configuration from `ECS_WORLD_CONFIG` (JSON, optional).
//! 2. Spawn particles with a position, a velocity, a lifetime, and a texture
//!    handle whose bank slot is released by a destruction hook.
//! 3. Run a fixed number of steps, destroying expired particles after each.

mod components;
mod systems;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use engine_ecs::{World, WorldConfig};
use glam::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;

use components::{Lifetime, Position, Texture, TextureBank, Velocity};

/// Simulation step settings.
#[derive(Debug, Clone)]
struct SimConfig {
    /// Steps per simulated second.
    step_rate: f32,
    /// Number of steps to run.
    steps: u64,
    /// Particles spawned up front.
    particles: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_rate: 60.0,
            steps: 180,
            particles: 256,
        }
    }
}

fn spawn_particles(world: &mut World, bank: &Rc<RefCell<TextureBank>>, count: u32) -> Result<()> {
    for i in 0..count {
        let angle = i as f32 * 0.37;
        let entity = world.new_entity();
        world.add_component(entity, Position(Vec2::ZERO))?;
        // Every fourth particle is static.
        let velocity = if i % 4 == 0 {
            Velocity::default()
        } else {
            Velocity(Vec2::from_angle(angle) * 3.0)
        };
        world.add_component(entity, velocity)?;
        world.add_component(entity, Lifetime::new(0.5 + (i % 5) as f32 * 0.5))?;
        let texture = bank.borrow_mut().acquire();
        world.add_component(entity, texture)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_demo=info".parse()?))
        .init();

    let config = WorldConfig::from_env()?;
    info!(?config, "engine demo starting");

    let sim = SimConfig::default();
    let bank = Rc::new(RefCell::new(TextureBank::new()));
    let mut world = World::with_config(config);

    let hook_bank = Rc::clone(&bank);
    world.set_on_destroy::<Texture, _>(move |_, texture| {
        hook_bank.borrow_mut().release(texture.slot);
    })?;

    spawn_particles(&mut world, &bank, sim.particles)?;
    info!(
        entities = world.entity_count(),
        textures = bank.borrow().live(),
        "spawned particles"
    );

    let dt = 1.0 / sim.step_rate;
    let mut expired = world.deferred_buffer();
    for step in 0..sim.steps {
        let destroyed = systems::step(&mut world, dt, &mut expired)?;
        if destroyed > 0 {
            info!(
                step,
                destroyed,
                alive = world.entity_count(),
                textures = bank.borrow().live(),
                "particles expired"
            );
        }
        if world.entity_count() == 0 {
            break;
        }
    }

    drop(world);
    info!(textures = bank.borrow().live(), "engine demo shut down");
    Ok(())
}
