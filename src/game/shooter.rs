//! Shooter - the aim, fire, land, resolve and rearm cycle.
//!
//! [`ShooterEngine`] owns the grid, the shooter slot and every in-progress
//! step of a shot. Hosts drive it with [`ShooterEngine::update`] and collect
//! notifications from its event outbox with [`ShooterEngine::drain_events`].
//!
//! ```text
//! Idle -> Aiming -> Firing -> Resolving -> Rearming -> Idle | Exhausted
//!   \-> Swapping -> Idle
//! ```
//!
//! Firing waits on each path segment, Resolving waits on the pop stagger and
//! Rearming waits on the elevation tween.

use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use super::{
    bubble::{Bubble, BubbleId, BubbleSpawner, BubbleType, BubbleTypeRegistry, SpecialKind},
    cluster::find_cluster,
    config::ShooterConfig,
    effects::{PopRules, PopSequence},
    elevation::{self, ElevationTween},
    error::{FireError, GridError, StageError},
    grid::{GridBounds, HexGrid},
    hex::{HexCoord, HexLayout},
    projectile::{Flight, FlightStep},
    stage::StageData,
    trajectory::{Trajectory, TrajectorySolver},
};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<ShooterState>();
}

/// Where the shooter is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum ShooterState {
    /// Loaded and waiting for input.
    #[default]
    Idle,
    /// Loaded with a live trajectory preview.
    Aiming,
    /// Exchanging the active and ready bubbles.
    Swapping,
    /// A bubble is travelling along its path.
    Firing,
    /// The landed cluster is popping.
    Resolving,
    /// The grid is settling and the next bubble is being loaded.
    Rearming,
    /// Out of ammo. The stage is over.
    Exhausted,
}

impl ShooterState {
    /// Whether the shooter accepts aim and fire input.
    pub fn is_armed(self) -> bool {
        matches!(self, ShooterState::Idle | ShooterState::Aiming)
    }
}

/// The bubbles waiting in the launcher.
#[derive(Debug, Clone, Default)]
pub struct ShooterSlot {
    pub active: Option<Bubble>,
    pub ready: Option<Bubble>,
    pub remaining_ammo: u32,
}

/// Notifications produced by the engine, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ShooterEvent {
    BubbleLanded {
        id: BubbleId,
        coord: HexCoord,
    },
    BubblePopped {
        id: BubbleId,
        bubble_type: BubbleType,
        position: Vec2,
    },
    /// A special effect targeted a bubble at `to`.
    PopIndicator {
        from: Vec2,
        to: Vec2,
    },
    AmmoChanged {
        remaining: u32,
    },
    Swapped {
        active: BubbleType,
        ready: BubbleType,
    },
    StageEnded,
}

/// The bubble shooter for one stage.
#[derive(Resource, Debug)]
pub struct ShooterEngine {
    config: ShooterConfig,
    grid: HexGrid,
    registry: BubbleTypeRegistry,
    /// Types dealt to the shooter.
    types: Vec<BubbleType>,
    slot: ShooterSlot,
    state: ShooterState,
    spawner: BubbleSpawner,
    rng: StdRng,
    solver: TrajectorySolver,
    aim: Option<Trajectory>,
    flight: Option<Flight>,
    pops: Option<PopSequence>,
    elevation: Option<ElevationTween>,
    swap_timer: f32,
    events: Vec<ShooterEvent>,
    stage_ended: bool,
}

impl ShooterEngine {
    /// Build the grid and shooter for a stage.
    ///
    /// Placements that fall outside the grid or on an occupied cell are
    /// skipped. Only invalid grid dimensions fail.
    pub fn load(stage: &StageData, config: ShooterConfig) -> Result<Self, StageError> {
        let bounds = GridBounds::new(stage.width, stage.height)?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let registry = stage.registry();
        let types = registry.types();

        let layout = HexLayout::centered(config.bubble_diameter, stage.width, 0.0);
        let mut grid = HexGrid::new(bounds, layout).with_visible_top(config.play_top);
        let mut spawner = BubbleSpawner::default();

        for placement in &stage.placements {
            let coord = placement.coord();
            if !bounds.contains(coord) {
                warn!("Skipping placement: {}", GridError::OutOfBounds(coord));
                continue;
            }
            let bubble = match placement.bubble_type {
                Some(bubble_type) => spawner.spawn(bubble_type, placement.special, Vec2::ZERO),
                None => {
                    let mut bubble = spawner.random_stage_bubble(
                        &types,
                        config.special_chance,
                        Vec2::ZERO,
                        &mut rng,
                    );
                    if placement.special != SpecialKind::None {
                        bubble.special = placement.special;
                    }
                    bubble
                }
            };
            if let Err(err) = grid.insert(coord, bubble) {
                warn!("Skipping placement: {err}");
            }
        }

        // Rest the lowest bubble on the baseline. Rows above the play boundary
        // stay hidden until the field is lifted down to them.
        match grid.lowest_bubble_y() {
            Some(lowest) => grid.set_origin_y(grid.origin_y() + config.baseline_y - lowest),
            None => grid.set_origin_y(config.play_top - config.bubble_diameter * 0.5),
        }

        let solver = TrajectorySolver::new(
            config.play_area(stage.width),
            config.bubble_diameter * 0.5,
        )
        .with_max_bounces(config.max_bounces)
        .with_max_ray_length(config.max_ray_length)
        .with_wall_offset(config.wall_offset);

        let mut engine = Self {
            config,
            grid,
            registry,
            types,
            slot: ShooterSlot {
                active: None,
                ready: None,
                remaining_ammo: stage.ammo,
            },
            state: ShooterState::Idle,
            spawner,
            rng,
            solver,
            aim: None,
            flight: None,
            pops: None,
            elevation: None,
            swap_timer: 0.0,
            events: Vec::new(),
            stage_ended: false,
        };

        info!(
            "Loaded {}x{} stage with {} bubbles and {} shots",
            stage.width,
            stage.height,
            engine.grid.len(),
            stage.ammo
        );

        if engine.grid.is_empty() || stage.ammo == 0 {
            engine.exhaust();
            return Ok(engine);
        }

        engine.slot.active = Some(engine.new_shooter_bubble());
        engine.slot.ready = Some(engine.new_shooter_bubble());
        engine.events.push(ShooterEvent::AmmoChanged {
            remaining: stage.ammo,
        });
        Ok(engine)
    }

    pub fn state(&self) -> ShooterState {
        self.state
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn slot(&self) -> &ShooterSlot {
        &self.slot
    }

    pub fn config(&self) -> &ShooterConfig {
        &self.config
    }

    pub fn registry(&self) -> &BubbleTypeRegistry {
        &self.registry
    }

    pub fn remaining_ammo(&self) -> u32 {
        self.slot.remaining_ammo
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == ShooterState::Exhausted
    }

    /// The current aim preview.
    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.aim.as_ref()
    }

    /// The bubble in flight, if any.
    pub fn flight(&self) -> Option<&Flight> {
        self.flight.as_ref()
    }

    /// Pending notifications, oldest first.
    pub fn events(&self) -> &[ShooterEvent] {
        &self.events
    }

    /// Take every pending notification.
    pub fn drain_events(&mut self) -> Vec<ShooterEvent> {
        std::mem::take(&mut self.events)
    }

    /// Update the aim and solve its trajectory. Ignored unless armed.
    pub fn aim(&mut self, direction: Vec2) -> Option<&Trajectory> {
        if !self.state.is_armed() || self.slot.active.is_none() {
            return None;
        }
        let trajectory = self
            .solver
            .solve(&self.grid, self.config.launch(), direction);
        self.state = ShooterState::Aiming;
        self.aim = Some(trajectory);
        self.aim.as_ref()
    }

    pub fn cancel_aim(&mut self) {
        if self.state == ShooterState::Aiming {
            self.state = ShooterState::Idle;
            self.aim = None;
        }
    }

    /// Fire the active bubble along the current aim.
    ///
    /// Refused without side effects when not aiming or when the aim has no
    /// snap cell.
    pub fn release(&mut self) -> Result<BubbleId, FireError> {
        if self.state != ShooterState::Aiming {
            debug!("Fire refused in {:?}", self.state);
            return Err(FireError::NotArmed(self.state));
        }
        let Some(trajectory) = self.aim.as_ref() else {
            return Err(FireError::NoSnapTarget);
        };
        let Some(snap) = trajectory.snap else {
            debug!("Fire refused: aim has no snap cell");
            return Err(FireError::NoSnapTarget);
        };
        let Some(bubble) = self.slot.active.take() else {
            warn!("Fire refused: nothing loaded");
            return Err(FireError::NothingLoaded);
        };

        let segments = trajectory.path.segments.clone();
        let id = bubble.id;
        info!(
            "Fired {:?} bubble {} towards {} ({} bounces)",
            bubble.bubble_type,
            id,
            snap.cell,
            trajectory.path.bounces()
        );

        self.flight = Some(Flight::new(
            bubble,
            segments,
            snap,
            self.config.projectile_speed,
        ));
        self.aim = None;
        self.state = ShooterState::Firing;
        Ok(id)
    }

    /// Aim and release in one call.
    pub fn fire(&mut self, direction: Vec2) -> Result<BubbleId, FireError> {
        self.aim(direction);
        self.release()
    }

    /// Exchange the active and ready bubbles. Only allowed while idle.
    pub fn swap(&mut self) -> Result<(), FireError> {
        if self.state != ShooterState::Idle {
            return Err(FireError::NotArmed(self.state));
        }
        let (Some(active), Some(ready)) = (self.slot.active.as_mut(), self.slot.ready.as_mut())
        else {
            return Err(FireError::NothingToSwap);
        };

        std::mem::swap(active, ready);
        let event = ShooterEvent::Swapped {
            active: active.bubble_type,
            ready: ready.bubble_type,
        };
        debug!("Swapped to {:?}", active.bubble_type);

        self.events.push(event);
        self.swap_timer = 0.0;
        self.state = ShooterState::Swapping;
        Ok(())
    }

    /// Advance the current step by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        match self.state {
            ShooterState::Idle | ShooterState::Aiming | ShooterState::Exhausted => {}
            ShooterState::Swapping => {
                self.swap_timer += dt;
                if self.swap_timer >= self.config.swap_secs {
                    self.state = ShooterState::Idle;
                }
            }
            ShooterState::Firing => self.update_flight(dt),
            ShooterState::Resolving => self.update_pops(dt),
            ShooterState::Rearming => self.update_elevation(dt),
        }
    }

    /// Abort whatever is in progress and return to a stable state.
    ///
    /// A bubble in flight goes back to the launcher and costs no ammo. A
    /// landed shot is settled immediately: pending pops are discarded and the
    /// grid jumps to its resting height.
    pub fn reset(&mut self) {
        match self.state {
            ShooterState::Firing => {
                if let Some(flight) = self.flight.take() {
                    let mut bubble = flight.into_bubble();
                    bubble.position = self.config.launch();
                    self.slot.active = Some(bubble);
                }
                self.state = ShooterState::Idle;
            }
            ShooterState::Resolving => {
                if let Some(pops) = self.pops.take() {
                    pops.abort(&mut self.grid);
                }
                self.settle_grid();
                self.finish_rearm();
            }
            ShooterState::Rearming => {
                self.settle_grid();
                self.finish_rearm();
            }
            ShooterState::Aiming => self.cancel_aim(),
            ShooterState::Swapping => self.state = ShooterState::Idle,
            ShooterState::Idle | ShooterState::Exhausted => {}
        }
        info!("Shooter reset to {:?}", self.state);
    }

    /// Abort everything and end the stage.
    pub fn end_stage(&mut self) {
        self.flight = None;
        if let Some(pops) = self.pops.take() {
            pops.abort(&mut self.grid);
        }
        if let Some(tween) = self.elevation.take() {
            tween.finish(&mut self.grid);
        }
        self.exhaust();
    }

    fn update_flight(&mut self, dt: f32) {
        let Some(flight) = self.flight.as_mut() else {
            self.begin_rearm();
            return;
        };
        match flight.advance(dt) {
            FlightStep::InFlight => {}
            FlightStep::SegmentComplete => {
                debug!("Bounced at {}", flight.position());
            }
            FlightStep::Arrived => {
                if let Some(flight) = self.flight.take() {
                    self.land(flight);
                }
            }
        }
    }

    /// Hand the bubble to the grid and look for a match.
    fn land(&mut self, flight: Flight) {
        let cell = flight.snap().cell;
        let bubble = flight.into_bubble();
        let id = bubble.id;
        if let Err(err) = self.grid.insert(cell, bubble) {
            warn!("Bubble {id} could not land: {err}");
            self.begin_rearm();
            return;
        }
        info!("Bubble {id} landed at {cell}");
        self.events.push(ShooterEvent::BubbleLanded { id, coord: cell });

        let set = find_cluster(&self.grid, cell);
        if set.is_empty() {
            self.begin_rearm();
            return;
        }

        info!("Popping cluster of {} bubbles from {cell}", set.len());
        self.pops = Some(PopSequence::from_match(&mut self.grid, &set));
        self.state = ShooterState::Resolving;
        self.update_pops(0.0);
    }

    fn update_pops(&mut self, dt: f32) {
        let rules = self.pop_rules();
        let Some(pops) = self.pops.as_mut() else {
            self.begin_rearm();
            return;
        };
        if pops.tick(dt, &mut self.grid, rules, &mut self.rng, &mut self.events) {
            self.pops = None;
            self.begin_rearm();
        }
    }

    fn begin_rearm(&mut self) {
        self.state = ShooterState::Rearming;
        self.elevation = elevation::plan(
            &self.grid,
            self.config.baseline_y,
            self.config.elevation_secs,
        );
        if self.elevation.is_none() {
            self.finish_rearm();
        }
    }

    fn update_elevation(&mut self, dt: f32) {
        if let Some(tween) = self.elevation.as_mut() {
            if !tween.tick(dt, &mut self.grid) {
                return;
            }
        }
        self.elevation = None;
        self.finish_rearm();
    }

    /// Move the grid straight to its resting height.
    fn settle_grid(&mut self) {
        let tween = self.elevation.take().or_else(|| {
            elevation::plan(&self.grid, self.config.baseline_y, self.config.elevation_secs)
        });
        if let Some(tween) = tween {
            tween.finish(&mut self.grid);
        }
    }

    /// Charge the shot and load the next bubble, or end the stage.
    fn finish_rearm(&mut self) {
        self.slot.remaining_ammo = self.slot.remaining_ammo.saturating_sub(1);
        let remaining = self.slot.remaining_ammo;
        self.events.push(ShooterEvent::AmmoChanged { remaining });

        if remaining == 0 {
            info!("Out of ammo");
            self.exhaust();
            return;
        }
        if self.grid.is_empty() {
            info!("Grid cleared with {remaining} shots left");
            self.exhaust();
            return;
        }

        let ready = match self.slot.ready.take() {
            Some(ready) => ready,
            None => self.new_shooter_bubble(),
        };
        self.slot.active = Some(ready);
        self.slot.ready = Some(self.new_shooter_bubble());
        self.state = ShooterState::Idle;
        debug!("Rearmed with {remaining} shots left");
    }

    /// Tear the slot down and announce the end of the stage once.
    fn exhaust(&mut self) {
        self.slot.active = None;
        self.slot.ready = None;
        self.aim = None;
        self.state = ShooterState::Exhausted;
        if !self.stage_ended {
            self.stage_ended = true;
            info!("Stage ended");
            self.events.push(ShooterEvent::StageEnded);
        }
    }

    fn new_shooter_bubble(&mut self) -> Bubble {
        let launch = self.config.launch();
        self.spawner
            .random_shooter_bubble(&self.types, launch, &mut self.rng)
    }

    fn pop_rules(&self) -> PopRules {
        PopRules {
            stagger: self.config.pop_stagger_secs,
            area_radius: self.config.area_clear_radius(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        bubble::RegistryEntry,
        stage::Placement,
    };

    fn red_stage(ammo: u32) -> StageData {
        StageData {
            width: 11,
            height: 10,
            placements: vec![
                Placement::new(0, 0, BubbleType::Red),
                Placement::new(10, 0, BubbleType::Cyan),
            ],
            ammo,
            types: Some(BubbleTypeRegistry::new(vec![RegistryEntry {
                bubble_type: BubbleType::Red,
                key: "red".into(),
            }])),
        }
    }

    fn engine(ammo: u32) -> ShooterEngine {
        ShooterEngine::load(&red_stage(ammo), ShooterConfig::default().with_seed(1)).unwrap()
    }

    /// Aim at the cell under the first placement.
    fn aim_at_red(engine: &ShooterEngine) -> Vec2 {
        let target = engine.grid().cell_to_world(HexCoord::new(0, 0)) + Vec2::new(4.0, 0.0);
        target - engine.config().launch()
    }

    fn stage_with(placements: Vec<Placement>, ammo: u32) -> ShooterEngine {
        let stage = StageData {
            placements,
            ..red_stage(ammo)
        };
        ShooterEngine::load(&stage, ShooterConfig::default().with_seed(1)).unwrap()
    }

    /// Fire into the cell below-right of `coord` and run until `state`.
    fn fire_until(engine: &mut ShooterEngine, coord: HexCoord, state: ShooterState) {
        let target = engine.grid().cell_to_world(coord) + Vec2::new(8.0, 0.0);
        engine.fire(target - engine.config().launch()).unwrap();
        for _ in 0..200 {
            if engine.state() == state {
                return;
            }
            engine.update(0.05);
        }
        panic!("never reached {state:?}, stuck in {:?}", engine.state());
    }

    fn red_trio() -> Vec<Placement> {
        vec![
            Placement::new(0, 0, BubbleType::Cyan),
            Placement::new(4, 0, BubbleType::Red),
            Placement::new(5, 0, BubbleType::Red),
            Placement::new(6, 0, BubbleType::Red),
        ]
    }

    fn settle(engine: &mut ShooterEngine) {
        for _ in 0..200 {
            if matches!(engine.state(), ShooterState::Idle | ShooterState::Exhausted) {
                return;
            }
            engine.update(0.05);
        }
        panic!("shooter never settled, stuck in {:?}", engine.state());
    }

    #[test]
    fn load_rests_lowest_bubble_on_baseline() {
        let engine = engine(3);
        assert!(engine.grid().lowest_bubble_y().unwrap().abs() < 1e-4);
        assert_eq!(engine.state(), ShooterState::Idle);
        assert!(engine.slot().active.is_some());
        assert!(engine.slot().ready.is_some());
        assert_eq!(
            engine.events(),
            &[ShooterEvent::AmmoChanged { remaining: 3 }]
        );
    }

    #[test]
    fn aim_without_snap_refuses_to_fire() {
        let mut engine = engine(3);
        engine.aim(Vec2::new(0.0, 1.0)).unwrap();
        assert_eq!(engine.state(), ShooterState::Aiming);

        assert_eq!(engine.release(), Err(FireError::NoSnapTarget));
        assert_eq!(engine.state(), ShooterState::Aiming);
        assert!(engine.slot().active.is_some());
        assert_eq!(engine.remaining_ammo(), 3);
    }

    #[test]
    fn downward_aim_refuses_to_fire() {
        let mut engine = engine(3);
        assert_eq!(engine.fire(Vec2::new(0.2, -1.0)), Err(FireError::NoSnapTarget));
        assert!(engine.flight().is_none());
    }

    #[test]
    fn release_without_aim_is_refused() {
        let mut engine = engine(3);
        assert_eq!(
            engine.release(),
            Err(FireError::NotArmed(ShooterState::Idle))
        );
    }

    #[test]
    fn no_input_accepted_while_firing() {
        let mut engine = engine(3);
        let aim = aim_at_red(&engine);
        engine.fire(aim).unwrap();
        assert_eq!(engine.state(), ShooterState::Firing);

        assert!(engine.aim(aim).is_none());
        assert_eq!(
            engine.fire(aim),
            Err(FireError::NotArmed(ShooterState::Firing))
        );
        assert_eq!(engine.swap(), Err(FireError::NotArmed(ShooterState::Firing)));
    }

    #[test]
    fn shot_lands_and_rearms() {
        let mut engine = engine(3);
        engine.drain_events();
        let active = engine.slot().active.as_ref().unwrap().id;
        let ready = engine.slot().ready.as_ref().unwrap().id;

        let fired = engine.fire(aim_at_red(&engine)).unwrap();
        assert_eq!(fired, active);
        settle(&mut engine);

        assert_eq!(engine.state(), ShooterState::Idle);
        assert_eq!(engine.remaining_ammo(), 2);
        assert_eq!(engine.slot().active.as_ref().unwrap().id, ready);
        assert_eq!(engine.grid().len(), 3);

        let events = engine.drain_events();
        assert!(matches!(events[0], ShooterEvent::BubbleLanded { id, .. } if id == fired));
        assert_eq!(events.last(), Some(&ShooterEvent::AmmoChanged { remaining: 2 }));
        // The landed bubble hangs below row 0, so the field was lifted.
        assert!(engine.grid().lowest_bubble_y().unwrap().abs() < 1e-3);
    }

    #[test]
    fn swap_exchanges_bubbles_then_idles() {
        let mut engine = engine(3);
        let active = engine.slot().active.as_ref().unwrap().id;
        let ready = engine.slot().ready.as_ref().unwrap().id;

        engine.swap().unwrap();
        assert_eq!(engine.state(), ShooterState::Swapping);
        assert_eq!(engine.slot().active.as_ref().unwrap().id, ready);
        assert_eq!(engine.slot().ready.as_ref().unwrap().id, active);
        assert!(engine.aim(Vec2::Y).is_none());

        engine.update(0.2);
        assert_eq!(engine.state(), ShooterState::Swapping);
        engine.update(0.2);
        assert_eq!(engine.state(), ShooterState::Idle);
    }

    #[test]
    fn reset_mid_flight_returns_bubble_free_of_charge() {
        let mut engine = engine(3);
        let fired = engine.fire(aim_at_red(&engine)).unwrap();
        engine.update(0.01);
        assert_eq!(engine.state(), ShooterState::Firing);

        engine.reset();
        assert_eq!(engine.state(), ShooterState::Idle);
        assert_eq!(engine.remaining_ammo(), 3);
        let active = engine.slot().active.as_ref().unwrap();
        assert_eq!(active.id, fired);
        assert_eq!(active.position, engine.config().launch());
        assert_eq!(engine.grid().len(), 2);
    }

    #[test]
    fn reset_while_resolving_discards_pending_pops() {
        let mut engine = stage_with(red_trio(), 5);
        fire_until(&mut engine, HexCoord::new(5, 0), ShooterState::Resolving);
        assert!(engine.grid().iter().any(|(_, b)| b.marked_for_pop));
        engine.drain_events();

        engine.reset();

        assert_eq!(engine.state(), ShooterState::Idle);
        assert!(engine.grid().iter().all(|(_, b)| !b.marked_for_pop));
        assert_eq!(engine.grid().len(), 1);
        assert!(engine.grid().lowest_bubble_y().unwrap().abs() < 1e-3);
        assert_eq!(engine.remaining_ammo(), 4);
        assert!(engine.slot().active.is_some());
        assert_eq!(
            engine.drain_events(),
            vec![ShooterEvent::AmmoChanged { remaining: 4 }]
        );

        // Nothing left over fires later.
        engine.update(1.0);
        assert_eq!(engine.state(), ShooterState::Idle);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn reset_while_rearming_settles_the_grid() {
        let cyan = vec![
            Placement::new(4, 0, BubbleType::Cyan),
            Placement::new(5, 0, BubbleType::Cyan),
            Placement::new(6, 0, BubbleType::Cyan),
        ];
        let mut engine = stage_with(cyan, 5);
        fire_until(&mut engine, HexCoord::new(5, 0), ShooterState::Rearming);
        // The new bottom row is still below the baseline mid-tween.
        assert!(engine.grid().lowest_bubble_y().unwrap() < -1e-3);

        engine.reset();

        assert_eq!(engine.state(), ShooterState::Idle);
        assert_eq!(engine.grid().len(), 4);
        assert!(engine.grid().lowest_bubble_y().unwrap().abs() < 1e-3);
        assert_eq!(engine.remaining_ammo(), 4);
        assert!(engine.slot().active.is_some());
        assert!(engine.slot().ready.is_some());
    }

    #[test]
    fn reset_while_resolving_the_last_shot_exhausts() {
        let mut engine = stage_with(red_trio(), 1);
        fire_until(&mut engine, HexCoord::new(5, 0), ShooterState::Resolving);
        engine.drain_events();

        engine.reset();

        assert!(engine.is_exhausted());
        assert!(engine.grid().iter().all(|(_, b)| !b.marked_for_pop));
        assert_eq!(
            engine.drain_events(),
            vec![
                ShooterEvent::AmmoChanged { remaining: 0 },
                ShooterEvent::StageEnded
            ]
        );
    }

    #[test]
    fn end_stage_while_resolving_leaves_nothing_marked() {
        let mut engine = stage_with(red_trio(), 5);
        fire_until(&mut engine, HexCoord::new(5, 0), ShooterState::Resolving);
        engine.drain_events();

        engine.end_stage();
        engine.update(1.0);
        engine.end_stage();

        assert!(engine.is_exhausted());
        assert!(engine.grid().iter().all(|(_, b)| !b.marked_for_pop));
        assert_eq!(engine.grid().len(), 1);
        assert_eq!(engine.drain_events(), vec![ShooterEvent::StageEnded]);
    }

    #[test]
    fn end_stage_is_announced_once() {
        let mut engine = engine(3);
        engine.drain_events();
        engine.end_stage();
        engine.end_stage();
        engine.update(1.0);

        assert!(engine.is_exhausted());
        assert!(engine.slot().active.is_none());
        assert_eq!(engine.drain_events(), vec![ShooterEvent::StageEnded]);
        assert!(engine.fire(Vec2::Y).is_err());
    }

    #[test]
    fn invalid_dimensions_fail_to_load() {
        let stage = StageData {
            width: -1,
            ..red_stage(3)
        };
        assert!(matches!(
            ShooterEngine::load(&stage, ShooterConfig::default()),
            Err(StageError::Grid(_))
        ));
    }

    #[test]
    fn zero_sized_stage_loads_empty_and_ends() {
        let stage = StageData {
            width: 0,
            height: 0,
            placements: Vec::new(),
            ..red_stage(3)
        };
        let mut engine = ShooterEngine::load(&stage, ShooterConfig::default()).unwrap();

        assert!(engine.grid().is_empty());
        assert!(engine.is_exhausted());
        assert_eq!(engine.drain_events(), vec![ShooterEvent::StageEnded]);
    }

    #[test]
    fn placements_below_the_authored_height_are_skipped() {
        let stage = StageData {
            height: 2,
            placements: vec![
                Placement::new(0, 0, BubbleType::Red),
                Placement::new(3, 1, BubbleType::Red),
                Placement::new(3, 2, BubbleType::Red),
            ],
            ..red_stage(3)
        };
        let engine = ShooterEngine::load(&stage, ShooterConfig::default()).unwrap();

        assert_eq!(engine.grid().len(), 2);
        assert!(!engine.grid().is_occupied(HexCoord::new(3, 2)));
    }
}
