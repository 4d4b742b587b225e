use std::mem;
use std::time::Duration;

use bevy_ecs::entity::Entity;
use bevy_utils::tracing::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::components::task::MoveIntent;
use crate::components::world::{EntityUid, MapUid, Player, Position};
use crate::content::{BuilderRegistry, MapLayoutDef, ResourceId, ResourceLibrary, ResourceRepository};
use crate::core::config::SimConfig;
use crate::core::error::SimError;
use crate::persistence::{EntityStore, SaveFiles};
use crate::simulation::{GameTime, Metronome, Scheduler, TickReport};
use crate::systems::{Rules, SimContext};
use crate::transport::{SimEndpoint, SimMode, ToSim, ToUi};
use crate::world::map::GameMap;

/// Session state that lives outside entity and map files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    time: GameTime,
    active_map: Option<MapUid>,
    rng: u64,
}

/// What the run loop does after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Wrapper around the entity store, content library and scheduler.
///
/// Events produced while handling input collect in an outbox; `run` forwards
/// them over the transport, tests read them with `drain_events`.
pub struct Simulation {
    config: SimConfig,
    rules: Rules,
    store: EntityStore,
    library: ResourceLibrary,
    scheduler: Scheduler,
    mode: SimMode,
    active_map: Option<MapUid>,
    rng: u64,
    outbox: Vec<ToUi>,
}

impl Simulation {
    pub fn new(config: SimConfig, repo: Box<dyn ResourceRepository>) -> Result<Self, SimError> {
        let files = SaveFiles::new(config.temp_root.clone(), config.save_root.clone())?;
        let mut store = EntityStore::open(
            files,
            BuilderRegistry::with_defaults(),
            config.store_limits(),
        )?;
        store.register_modules(&config.modules)?;

        Ok(Self {
            rules: config.rules(),
            store,
            library: ResourceLibrary::new(repo),
            scheduler: Scheduler::new(config.queue_discipline),
            mode: SimMode::TurnBased,
            active_map: None,
            rng: config.seed,
            outbox: Vec::new(),
            config,
        })
    }

    /// Resume the session left in the temp root, or spawn the player on the
    /// configured start map.
    pub fn start(&mut self) -> Result<(), SimError> {
        if let Some(session) = self.store.files().read_session::<SessionRecord>()? {
            self.apply_session(session);
            if self.active_map.is_some() && self.store.contains(EntityUid::PLAYER) {
                self.store.pin_map(self.active_map);
                info!(map = ?self.active_map, "resumed session");
                return Ok(());
            }
        }
        self.spawn_player()?;
        let start = self.config.start_map.clone();
        self.enter_map(&start)?;
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn mode(&self) -> SimMode {
        self.mode
    }

    pub fn active_map(&self) -> Option<MapUid> {
        self.active_map
    }

    pub fn time(&self) -> GameTime {
        *self.store.world().resource::<GameTime>()
    }

    pub fn player_position(&mut self) -> Option<Position> {
        let player = self.store.get(EntityUid::PLAYER).ok()?;
        self.store.world().get::<Position>(player).copied()
    }

    pub fn drain_events(&mut self) -> Vec<ToUi> {
        mem::take(&mut self.outbox)
    }

    /// Build (or reuse) the map for a layout resource and put the player on it.
    pub fn enter_map(&mut self, id: &ResourceId) -> Result<MapUid, SimError> {
        let resource = self.library.get(id)?;
        let layout = resource.as_map_layout()?;
        let module_name = id.module().ok_or_else(|| SimError::Unqualified(id.clone()))?;
        let module = self
            .store
            .modules()
            .uid_of(module_name)
            .ok_or_else(|| SimError::UnknownModule(module_name.to_string()))?;
        let uid = MapUid::compose(module, layout.local_uid);

        if !self.store.contains_map(uid) {
            self.build_map(uid, layout)?;
        }
        self.place_player(uid, layout.player_start)?;
        self.active_map = Some(uid);
        self.store.pin_map(Some(uid));
        info!(map = %uid, resource = %id, "entered map");
        Ok(uid)
    }

    /// Queue a step for the player. In turn-based mode this runs a full tick.
    pub fn move_player(&mut self, dx: i32, dy: i32) -> Result<Option<TickReport>, SimError> {
        let player = self.store.get(EntityUid::PLAYER)?;
        self.store
            .world_mut()
            .entity_mut(player)
            .insert(MoveIntent { dx, dy });
        match self.mode {
            SimMode::TurnBased => self.tick(1.0).map(Some),
            SimMode::RealTime => Ok(None),
        }
    }

    pub fn tick(&mut self, fraction: f32) -> Result<TickReport, SimError> {
        let active_map = self.active_map.ok_or(SimError::NoActiveMap)?;
        let mut ctx = SimContext {
            store: &mut self.store,
            rules: &self.rules,
            active_map,
            player: EntityUid::PLAYER,
            events: &mut self.outbox,
            rng: &mut self.rng,
        };
        let report = self.scheduler.run_tick(&mut ctx, fraction)?;
        self.store.trim()?;

        let time = {
            let mut time = self.store.world_mut().resource_mut::<GameTime>();
            time.advance(fraction);
            *time
        };
        debug!(%time, passes = report.passes.len(), "tick completed");
        self.outbox.push(ToUi::TickCompleted {
            tick: time.tick,
            turn: time.turn,
            fraction,
        });
        Ok(report)
    }

    pub fn set_mode(&mut self, mode: SimMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        info!(?mode, "mode changed");
        self.outbox.push(ToUi::ModeChanged { mode });
    }

    /// Apply one inbound event. Recoverable failures are logged and reported
    /// as a `Message`; only `Quit` stops the loop.
    pub fn handle(&mut self, event: ToSim) -> Control {
        let result = match event {
            ToSim::MovePlayer { dx, dy } => self.move_player(dx, dy).map(|_| ()),
            ToSim::Wait | ToSim::AdvanceTurn => match self.mode {
                SimMode::TurnBased => self.tick(1.0).map(|_| ()),
                SimMode::RealTime => Ok(()),
            },
            ToSim::Heartbeat => match self.mode {
                SimMode::RealTime => self.tick(self.config.realtime_fraction()).map(|_| ()),
                SimMode::TurnBased => Ok(()),
            },
            ToSim::TogglePause => {
                self.set_mode(self.mode.toggled());
                Ok(())
            }
            ToSim::Save { name } => self.save_game(&name),
            ToSim::Load { name } => self.load_game(&name),
            ToSim::Quit => {
                if let Err(err) = self.shutdown() {
                    error!("flush on quit failed: {}", err);
                }
                return Control::Quit;
            }
        };

        if let Err(err) = result {
            error!("{}", err);
            self.outbox.push(ToUi::Message {
                text: err.to_string(),
            });
        }
        Control::Continue
    }

    /// Flush everything and copy the temp root into a named save.
    pub fn save_game(&mut self, name: &str) -> Result<(), SimError> {
        self.store.flush_all()?;
        self.store.files().write_session(&self.session())?;
        self.store.files().save_snapshot(name)?;
        info!(name, "game saved");
        self.outbox.push(ToUi::Saved {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Replace the working state with a named save. Unsaved progress is lost.
    pub fn load_game(&mut self, name: &str) -> Result<(), SimError> {
        self.store.files().restore_snapshot(name)?;
        self.store.reload(&self.config.modules)?;
        match self.store.files().read_session::<SessionRecord>()? {
            Some(session) => self.apply_session(session),
            None => {
                warn!(name, "save has no session record");
                *self.store.world_mut().resource_mut::<GameTime>() = GameTime::default();
                self.active_map = None;
            }
        }
        self.store.pin_map(self.active_map);
        self.set_mode(SimMode::TurnBased);
        info!(name, "game loaded");
        self.outbox.push(ToUi::Message {
            text: format!("loaded {}", name),
        });
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<(), SimError> {
        self.store.flush_all()?;
        self.store.files().write_session(&self.session())?;
        info!("simulation state flushed");
        Ok(())
    }

    /// Serve the transport until `Quit` arrives or the presentation side
    /// hangs up. A metronome runs while the mode is real-time.
    ///
    /// A hang-up shows as a closed inbox, or as a failed send while the
    /// metronome keeps the inbox open. Either way state is flushed as on
    /// `Quit`.
    pub fn run(mut self, endpoint: SimEndpoint) {
        let mut metronome: Option<Metronome> = None;
        let mut quit = false;
        while let Some(event) = endpoint.recv() {
            let control = self.handle(event);
            let delivered = self
                .drain_events()
                .into_iter()
                .fold(true, |ok, event| endpoint.send(event) && ok);
            if control == Control::Quit {
                quit = true;
                break;
            }
            if !delivered {
                break;
            }

            match (self.mode, metronome.is_some()) {
                (SimMode::RealTime, false) => {
                    let interval = Duration::from_millis(self.config.heartbeat_ms);
                    metronome = endpoint
                        .loopback()
                        .map(|tx| Metronome::start(tx, interval));
                }
                (SimMode::TurnBased, true) => metronome = None,
                _ => {}
            }
        }
        drop(metronome);

        if !quit {
            info!("presentation side hung up");
            if let Err(err) = self.shutdown() {
                error!("failed to flush after hang-up: {}", err);
            }
        }
        info!("simulation loop stopped");
    }

    fn spawn_player(&mut self) -> Result<Entity, SimError> {
        if self.store.contains(EntityUid::PLAYER) {
            return Ok(self.store.get(EntityUid::PLAYER)?);
        }
        let species = self.library.get(&self.config.player_species)?;
        let player = self.store.create(EntityUid::PLAYER, &species)?;
        self.store.world_mut().entity_mut(player).insert(Player);
        Ok(player)
    }

    fn build_map(&mut self, uid: MapUid, layout: &MapLayoutDef) -> Result<(), SimError> {
        let map = GameMap::new(
            uid,
            layout.width,
            layout.height,
            layout.default_terrain,
            self.store.leaf_capacity(),
        )
        .with_regions(&layout.terrain, &layout.elevation)?;
        self.store.insert_map(map)?;

        for placement in &layout.placements {
            let template = self.library.get(&placement.resource)?;
            let entity_uid = self.store.generate_uid(uid.module())?;
            let entity = self.store.create(entity_uid, &template)?;
            self.store.world_mut().entity_mut(entity).insert(Position {
                map: uid,
                x: placement.x,
                y: placement.y,
            });
            let placed = self
                .store
                .map_mut(uid)?
                .add_entity(entity_uid, placement.x, placement.y);
            if let Err(err) = placed {
                self.store.remove(entity_uid)?;
                return Err(err.into());
            }
        }
        debug!(map = %uid, placements = layout.placements.len(), "map built");
        Ok(())
    }

    fn place_player(&mut self, map: MapUid, at: (i32, i32)) -> Result<(), SimError> {
        let player = self.spawn_player()?;
        if let Some(previous) = self.store.world().get::<Position>(player).copied() {
            if let Err(err) = self.store.map_mut(previous.map)?.remove_entity(EntityUid::PLAYER) {
                debug!("player was not indexed on {}: {}", previous.map, err);
            }
        }
        self.store
            .map_mut(map)?
            .add_entity(EntityUid::PLAYER, at.0, at.1)?;
        let player = self.store.get(EntityUid::PLAYER)?;
        self.store.world_mut().entity_mut(player).insert(Position {
            map,
            x: at.0,
            y: at.1,
        });
        Ok(())
    }

    fn session(&self) -> SessionRecord {
        SessionRecord {
            time: self.time(),
            active_map: self.active_map,
            rng: self.rng,
        }
    }

    fn apply_session(&mut self, session: SessionRecord) {
        *self.store.world_mut().resource_mut::<GameTime>() = session.time;
        self.active_map = session.active_map;
        self.rng = session.rng;
    }
}
