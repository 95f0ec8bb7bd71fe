//! The main game module for the bubble shooter.
//!
//! This module contains all the gameplay logic including:
//! - Hexagonal grid system (odd-r offset coordinates)
//! - Bubble types, special bubbles and the type registry
//! - Trajectory solving with wall bounces and snap cells
//! - Cluster detection and the staggered pop sequence
//! - The shooter state machine and container elevation
//!
//! The core runs without Bevy through [`ShooterEngine`]. The plugin below
//! owns the engine as a resource, ticks it from [`Time`] and turns its event
//! outbox into Bevy messages.

pub mod bubble;
pub mod cluster;
pub mod config;
pub mod effects;
pub mod elevation;
pub mod error;
pub mod grid;
pub mod hex;
pub mod projectile;
pub mod shooter;
pub mod stage;
pub mod trajectory;

use bevy::prelude::*;

pub use self::{
    bubble::{BubbleId, BubbleType, BubbleTypeRegistry, SpecialKind},
    config::ShooterConfig,
    hex::HexCoord,
    shooter::{ShooterEngine, ShooterEvent, ShooterState},
    stage::StageData,
};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((hex::plugin, bubble::plugin, shooter::plugin));

    app.add_message::<LoadStage>();
    app.add_message::<AimShooter>();
    app.add_message::<ReleaseShot>();
    app.add_message::<CancelAim>();
    app.add_message::<SwapBubbles>();
    app.add_message::<ResetStage>();
    app.add_message::<EndStage>();

    app.add_message::<BubbleLanded>();
    app.add_message::<BubblePopped>();
    app.add_message::<PopIndicator>();
    app.add_message::<AmmoChanged>();
    app.add_message::<BubblesSwapped>();
    app.add_message::<StageEnded>();

    app.add_systems(
        Update,
        (load_stage, handle_shooter_input, tick_shooter)
            .chain()
            .in_set(ShooterSystems),
    );
}

/// System set for the shooter systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShooterSystems;

/// Message to replace the current stage.
#[derive(Message, Debug, Clone)]
pub struct LoadStage {
    pub stage: StageData,
    pub config: ShooterConfig,
}

/// Message to point the shooter. Updates the trajectory preview.
#[derive(Message, Debug, Clone)]
pub struct AimShooter {
    pub direction: Vec2,
}

/// Message to fire along the current aim.
#[derive(Message, Debug, Clone)]
pub struct ReleaseShot;

#[derive(Message, Debug, Clone)]
pub struct CancelAim;

/// Message to exchange the active and ready bubbles.
#[derive(Message, Debug, Clone)]
pub struct SwapBubbles;

/// Message to abort the current shot and return to a stable state.
#[derive(Message, Debug, Clone)]
pub struct ResetStage;

#[derive(Message, Debug, Clone)]
pub struct EndStage;

/// Message sent when a bubble lands on the grid.
#[derive(Message, Debug, Clone)]
pub struct BubbleLanded {
    pub id: BubbleId,
    pub coord: HexCoord,
}

/// Message sent for every popped bubble. `key` comes from the stage's type
/// registry.
#[derive(Message, Debug, Clone)]
pub struct BubblePopped {
    pub id: BubbleId,
    pub bubble_type: BubbleType,
    pub position: Vec2,
    pub key: String,
}

/// Message sent when a special effect targets a bubble.
#[derive(Message, Debug, Clone)]
pub struct PopIndicator {
    pub from: Vec2,
    pub to: Vec2,
}

#[derive(Message, Debug, Clone)]
pub struct AmmoChanged {
    pub remaining: u32,
}

#[derive(Message, Debug, Clone)]
pub struct BubblesSwapped {
    pub active: BubbleType,
    pub ready: BubbleType,
}

/// Message sent once when the stage is over.
#[derive(Message, Debug, Clone)]
pub struct StageEnded;

fn load_stage(mut commands: Commands, mut requests: MessageReader<LoadStage>) {
    for request in requests.read() {
        match ShooterEngine::load(&request.stage, request.config.clone()) {
            Ok(engine) => commands.insert_resource(engine),
            Err(err) => error!("Failed to load stage: {err}"),
        }
    }
}

fn handle_shooter_input(
    engine: Option<ResMut<ShooterEngine>>,
    mut resets: MessageReader<ResetStage>,
    mut ends: MessageReader<EndStage>,
    mut cancels: MessageReader<CancelAim>,
    mut swaps: MessageReader<SwapBubbles>,
    mut aims: MessageReader<AimShooter>,
    mut releases: MessageReader<ReleaseShot>,
) {
    let Some(mut engine) = engine else {
        resets.clear();
        ends.clear();
        cancels.clear();
        swaps.clear();
        aims.clear();
        releases.clear();
        return;
    };

    for _ in resets.read() {
        engine.reset();
    }
    for _ in ends.read() {
        engine.end_stage();
    }
    for _ in cancels.read() {
        engine.cancel_aim();
    }
    for _ in swaps.read() {
        if let Err(err) = engine.swap() {
            debug!("Swap refused: {err}");
        }
    }
    // Only the latest aim matters.
    if let Some(aim) = aims.read().last() {
        engine.aim(aim.direction);
    }
    for _ in releases.read() {
        if let Err(err) = engine.release() {
            debug!("Shot refused: {err}");
        }
    }
}

fn tick_shooter(
    time: Res<Time>,
    engine: Option<ResMut<ShooterEngine>>,
    mut landed: MessageWriter<BubbleLanded>,
    mut popped: MessageWriter<BubblePopped>,
    mut indicators: MessageWriter<PopIndicator>,
    mut ammo: MessageWriter<AmmoChanged>,
    mut swapped: MessageWriter<BubblesSwapped>,
    mut ended: MessageWriter<StageEnded>,
) {
    let Some(mut engine) = engine else {
        return;
    };

    engine.update(time.delta_secs());

    for event in engine.drain_events() {
        match event {
            ShooterEvent::BubbleLanded { id, coord } => {
                landed.write(BubbleLanded { id, coord });
            }
            ShooterEvent::BubblePopped {
                id,
                bubble_type,
                position,
            } => {
                let key = engine
                    .registry()
                    .key(bubble_type)
                    .unwrap_or(bubble_type.default_key())
                    .to_string();
                popped.write(BubblePopped {
                    id,
                    bubble_type,
                    position,
                    key,
                });
            }
            ShooterEvent::PopIndicator { from, to } => {
                indicators.write(PopIndicator { from, to });
            }
            ShooterEvent::AmmoChanged { remaining } => {
                ammo.write(AmmoChanged { remaining });
            }
            ShooterEvent::Swapped { active, ready } => {
                swapped.write(BubblesSwapped { active, ready });
            }
            ShooterEvent::StageEnded => {
                ended.write(StageEnded);
            }
        }
    }
}
