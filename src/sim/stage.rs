/// Stage: one running level.
///
/// Owns the visual tilemap, the collision map built from it, the camera and
/// every object. `step()` advances one frame:
///
///   1. Camera follow
///   2. Camera check (all objects)
///   3. Color-block switch
///   4. Update (all objects), then spawn requested shots
///   5. Tile collisions
///   6. Platform carry
///   7. Walkers turn at ledges
///   8. World edges
///   9. Water / lava
///  10. Object interactions (stomp, touch damage, shots, separation)
///  11. Player death, respawn and exit
///
/// Terrain is resolved after movement, so every hook sees this frame's
/// positions. `touch_surface` is reset right before step 5 and therefore
/// still reflects last frame's contact during step 4.

use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::camera::Camera;
use crate::domain::collision::{CollisionObject, SlopeMargins, FLOOR, WALL_LEFT, WALL_RIGHT};
use crate::domain::collision_map::{CollisionMap, MapError};
use crate::domain::math::{Rect, Vector};
use crate::domain::object::{Canvas, FrameEvent, GameObject};
use crate::domain::pool::ObjectPool;
use crate::domain::tile::{TILE_HEIGHT, TILE_WIDTH};
use crate::domain::tilemap::{Tilemap, VISUAL_LAYERS};
use super::entities::{Bullet, Enemy, EnemyKind, Platform, Player};
use super::event::GameEvent;
use super::level::{builtin_tileset, color_block_partner, Level, LevelDef, LevelError, SpawnKind, LAVA, WATER};

pub const STARTING_LIVES: u32 = 3;
const ENEMY_TOUCH_DAMAGE: i32 = 1;
/// How far below an enemy's top the player's feet may have been last frame
/// for a landing to count as a stomp.
const STOMP_TOLERANCE: f32 = 4.0;

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("level has no player spawn")]
    NoPlayerSpawn,
    #[error("unknown enemy id {id} at ({x}, {y})")]
    UnknownEnemy { id: u8, x: f32, y: f32 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Liquid {
    Water,
    Lava,
}

pub struct Stage {
    pub name: String,
    visual: Tilemap,
    tileset: Tilemap,
    map: CollisionMap,
    pub camera: Camera,
    pub player: Player,
    spawn_point: Vector,
    pub enemies: ObjectPool<Enemy>,
    pub bullets: ObjectPool<Bullet>,
    pub platforms: Vec<Platform>,
    /// Tile indices holding a color block in any layer.
    color_blocks: Vec<usize>,
    world_w: f32,
    world_h: f32,
    pub lives: u32,
    pub frame: u64,
    player_down: bool,
    cleared: bool,
    over: bool,
}

impl Stage {
    pub fn load(def: &LevelDef, config: &GameConfig) -> Result<Stage, StageError> {
        Stage::new(def.build()?, config)
    }

    pub fn new(level: Level, config: &GameConfig) -> Result<Stage, StageError> {
        let tileset = builtin_tileset();
        let map = CollisionMap::new(&level.visual, &tileset)?;
        let (world_w, world_h) = level.world_size();

        let spawn_point = level
            .spawns
            .iter()
            .find(|s| s.kind == SpawnKind::Player)
            .map(|s| s.pos)
            .ok_or(StageError::NoPlayerSpawn)?;

        let mut enemies = ObjectPool::new();
        let mut platforms = vec![];
        for spawn in &level.spawns {
            match spawn.kind {
                SpawnKind::Player => {}
                SpawnKind::Enemy(id) => {
                    let kind = EnemyKind::from_id(id).ok_or(StageError::UnknownEnemy {
                        id,
                        x: spawn.pos.x,
                        y: spawn.pos.y,
                    })?;
                    let (_, slot) = enemies.next();
                    *slot = kind.spawn(spawn.pos);
                }
                SpawnKind::Platform { vertical } => platforms.push(Platform::new(spawn.pos, vertical)),
            }
        }

        let color_blocks = (0..level.visual.len())
            .filter(|&i| {
                VISUAL_LAYERS
                    .iter()
                    .any(|layer| color_block_partner(level.visual.get_indexed_tile(layer, i)).is_some())
            })
            .collect();

        let mut camera = Camera::new(config.camera.width, config.camera.height);
        camera.center_on(spawn_point, world_w, world_h);

        log::info!(
            "stage \"{}\": {} enemies, {} platforms",
            level.name,
            enemies.live_count(),
            platforms.len()
        );

        Ok(Stage {
            name: level.name,
            visual: level.visual,
            tileset,
            map,
            camera,
            player: Player::new(spawn_point, config.physics.clone()),
            spawn_point,
            enemies,
            bullets: ObjectPool::with_capacity(8),
            platforms,
            color_blocks,
            world_w,
            world_h,
            lives: STARTING_LIVES,
            frame: 0,
            player_down: false,
            cleared: false,
            over: false,
        })
    }

    pub fn visual(&self) -> &Tilemap {
        &self.visual
    }

    pub fn collision_map(&self) -> &CollisionMap {
        &self.map
    }

    pub fn world_size(&self) -> (f32, f32) {
        (self.world_w, self.world_h)
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Change the visible area (terminal resize).
    pub fn resize_view(&mut self, width: f32, height: f32) {
        self.camera.width = width;
        self.camera.height = height;
        self.camera.center_on(self.player.position(), self.world_w, self.world_h);
    }

    // ══════════════════════════════════════════════════════════════
    // Main entry point
    // ══════════════════════════════════════════════════════════════

    pub fn step(&mut self, event: &FrameEvent) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.cleared || self.over {
            return events;
        }
        self.frame += 1;
        let health_before = self.player.health;

        self.camera.follow(self.player.position(), self.world_w, self.world_h);
        self.camera_check_all(event);
        if event.input.switch_pressed {
            let changed = self.toggle_color_blocks();
            events.push(GameEvent::ColorBlocksToggled { changed });
        }
        self.update_all(event, &mut events);
        self.resolve_terrain(event);
        self.resolve_platforms(event);
        self.resolve_ledges();
        self.resolve_world_edges(event);
        self.resolve_liquids(event, &mut events);
        self.resolve_interactions(event, &mut events);

        if self.player.health < health_before && self.player.health > 0 {
            events.push(GameEvent::PlayerHurt { health: self.player.health });
        }
        self.resolve_player_state(&mut events);
        events
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        for platform in &self.platforms {
            platform.draw(canvas);
        }
        for enemy in self.enemies.iter() {
            enemy.draw(canvas);
        }
        for bullet in self.bullets.iter() {
            bullet.draw(canvas);
        }
        self.player.draw(canvas);
    }

    // ══════════════════════════════════════════════════════════════
    // Color blocks
    // ══════════════════════════════════════════════════════════════

    /// Swap every color block between its solid and ghost state and patch
    /// the collision map on exactly those tiles. Returns the number of
    /// tiles swapped.
    pub fn toggle_color_blocks(&mut self) -> usize {
        let width = self.visual.width;
        for &i in &self.color_blocks {
            for layer in VISUAL_LAYERS {
                let id = self.visual.get_indexed_tile(layer, i);
                if let Some(other) = color_block_partner(id) {
                    self.visual.set_tile(layer, i % width, i / width, other);
                }
            }
        }
        self.map.recompute_collision_tiles(&self.visual, &self.tileset, &self.color_blocks);
        log::debug!("toggled {} color blocks", self.color_blocks.len());
        self.color_blocks.len()
    }

    // ══════════════════════════════════════════════════════════════
    // Pipeline stages
    // ══════════════════════════════════════════════════════════════

    fn camera_check_all(&mut self, event: &FrameEvent) {
        let camera = &self.camera;
        self.player.camera_check(camera, event);
        for platform in &mut self.platforms {
            platform.camera_check(camera, event);
        }
        for enemy in self.enemies.iter_mut() {
            enemy.camera_check(camera, event);
        }
        for bullet in self.bullets.iter_mut() {
            bullet.camera_check(camera, event);
            // Shots are not kept frozen off screen.
            if bullet.does_exist() && !bullet.core().in_camera {
                bullet.force_kill();
            }
        }
    }

    fn update_all(&mut self, event: &FrameEvent, events: &mut Vec<GameEvent>) {
        for platform in &mut self.platforms {
            platform.update(event);
        }
        self.player.update(event);
        for enemy in self.enemies.iter_mut() {
            enemy.update(event);
        }
        for bullet in self.bullets.iter_mut() {
            bullet.update(event);
        }

        if let Some((pos, dir)) = self.player.take_shot() {
            let (_, bullet) = self.bullets.next();
            bullet.fire(pos, dir);
            events.push(GameEvent::ShotFired);
        }
    }

    fn resolve_terrain(&mut self, event: &FrameEvent) {
        let map = &self.map;
        collide_with_tiles(map, &mut self.player, event);
        for enemy in self.enemies.iter_mut() {
            collide_with_tiles(map, enemy, event);
        }
        for bullet in self.bullets.iter_mut() {
            collide_with_tiles(map, bullet, event);
        }
    }

    /// Platform tops are one-way floors that link whatever lands on them.
    fn resolve_platforms(&mut self, event: &FrameEvent) {
        for platform in &self.platforms {
            if !platform.does_exist() {
                continue;
            }
            let top = platform.top_segment();
            let carry = Some(platform.carry_speed());
            self.player.slope_collision(top, FLOOR, event, SlopeMargins::default(), carry);
            for enemy in self.enemies.iter_mut() {
                enemy.slope_collision(top, FLOOR, event, SlopeMargins::default(), carry);
            }
        }
    }

    /// Walkers turn back rather than step off a drop deeper than a tile.
    fn resolve_ledges(&mut self) {
        for enemy in self.enemies.iter_mut() {
            if let Some(foot) = enemy.foot_ahead() {
                if !self.map.has_floor_below(foot.x, foot.y, TILE_HEIGHT) {
                    enemy.turn_around();
                }
            }
        }
    }

    fn resolve_world_edges(&mut self, event: &FrameEvent) {
        let (w, h) = (self.world_w, self.world_h);
        world_edges(&mut self.player, w, h, event);
        for enemy in self.enemies.iter_mut() {
            world_edges(enemy, w, h, event);
        }
        for bullet in self.bullets.iter_mut() {
            world_edges(bullet, w, h, event);
        }

        // Falling out of the world.
        if fell_out(&self.player, h) {
            self.player.health = 0;
            self.player.kill();
        }
        for enemy in self.enemies.iter_mut() {
            if enemy.does_exist() && fell_out(enemy, h) {
                enemy.force_kill();
            }
        }
    }

    fn resolve_liquids(&mut self, event: &FrameEvent, events: &mut Vec<GameEvent>) {
        let was_submerged = self.player.is_submerged();
        let (water, _) = touch_liquids(&self.visual, &mut self.player, event);
        if water && !was_submerged {
            events.push(GameEvent::PlayerSplash);
        }
        for enemy in self.enemies.iter_mut() {
            touch_liquids(&self.visual, enemy, event);
        }
    }

    fn resolve_interactions(&mut self, event: &FrameEvent, events: &mut Vec<GameEvent>) {
        let player = &mut self.player;

        for enemy in self.enemies.iter_mut() {
            if !enemy.is_active() || !player.is_active() {
                continue;
            }
            if !overlaps(&*player, &*enemy) {
                continue;
            }
            let (l, t, r, b) = hitbox_bounds(&*enemy);
            let (_, _, _, old_feet) = player.core().hitbox.bounds_at(player.core().old_pos);
            if player.core().speed.y > 0.0 && old_feet <= t + STOMP_TOLERANCE {
                enemy.kill();
                player.stomp_bounce();
                events.push(GameEvent::EnemyStomped { kind: enemy.kind() });
            } else {
                player.hurt_collision(l, t, r - l, b - t, ENEMY_TOUCH_DAMAGE, event);
            }
        }

        for bullet in self.bullets.iter_mut() {
            if !bullet.is_active() {
                continue;
            }
            let shot: &Bullet = bullet;
            if let Some(enemy) = self.enemies.iter_mut().find(|e| e.is_active() && overlaps(shot, &**e)) {
                enemy.kill();
                bullet.force_kill();
                events.push(GameEvent::EnemyKilled { kind: enemy.kind() });
            }
        }

        // Enemies don't stack on top of each other.
        let circles: Vec<(Vector, f32)> = self
            .enemies
            .iter()
            .map(|e| if e.is_active() { (e.position(), e.body().collision_radius) } else { (e.position(), -1.0) })
            .collect();
        for (j, enemy) in self.enemies.iter_mut().enumerate() {
            for &(center, radius) in &circles[..j] {
                if radius > 0.0 {
                    enemy.push_out_of(center, radius);
                }
            }
        }
    }

    fn resolve_player_state(&mut self, events: &mut Vec<GameEvent>) {
        if self.player.reached_exit {
            log::info!("stage \"{}\" cleared at frame {}", self.name, self.frame);
            self.cleared = true;
            events.push(GameEvent::StageCleared);
            return;
        }

        if self.player.is_dying() && !self.player_down {
            self.player_down = true;
            events.push(GameEvent::PlayerKilled);
        }

        if !self.player.does_exist() {
            if !self.player_down {
                events.push(GameEvent::PlayerKilled);
            }
            self.player_down = false;
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                log::info!("game over on \"{}\"", self.name);
                self.over = true;
                events.push(GameEvent::GameOver);
                return;
            }
            self.player.respawn(self.spawn_point);
            self.bullets.clear();
            self.camera.center_on(self.spawn_point, self.world_w, self.world_h);
            events.push(GameEvent::PlayerRespawned);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn collide_with_tiles<O: CollisionObject>(map: &CollisionMap, obj: &mut O, event: &FrameEvent) {
    if !obj.is_active() {
        return;
    }
    obj.reset_contact();
    let ignore_bottom = obj.body().ignore_bottom_layer;
    map.object_collision(obj, event, ignore_bottom);
}

/// Keep an object inside the horizontal world bounds, unless it takes over
/// the crossing itself.
fn world_edges<O: CollisionObject>(obj: &mut O, world_w: f32, world_h: f32, event: &FrameEvent) {
    if !obj.is_active() {
        return;
    }
    let (left, _, right, _) = obj.body().collision_box.bounds_at(obj.position());
    let (top, height) = (-world_h, world_h * 3.0);

    if left < 0.0 && !obj.screen_transition_event(0.0, WALL_LEFT, event) {
        obj.wall_collision(0.0, top, height, WALL_LEFT, event);
    }
    if right > world_w && !obj.screen_transition_event(world_w, WALL_RIGHT, event) {
        obj.wall_collision(world_w, top, height, WALL_RIGHT, event);
    }
}

fn fell_out<O: CollisionObject>(obj: &O, world_h: f32) -> bool {
    let (_, top, _, _) = obj.body().collision_box.bounds_at(obj.position());
    top > world_h
}

/// Fire the water and lava hooks for every liquid tile the collision box
/// overlaps. Returns which of the two were touched.
fn touch_liquids<O: CollisionObject>(visual: &Tilemap, obj: &mut O, event: &FrameEvent) -> (bool, bool) {
    let mut touched = (false, false);
    if !obj.is_active() {
        return touched;
    }
    let (l, t, r, b) = obj.body().collision_box.bounds_at(obj.position());
    let (x0, x1) = ((l / TILE_WIDTH).floor() as i32, (r / TILE_WIDTH).floor() as i32);
    let (y0, y1) = ((t / TILE_HEIGHT).floor() as i32, (b / TILE_HEIGHT).floor() as i32);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let liquid = match visual.get_tile("middle", x, y) {
                WATER => Liquid::Water,
                LAVA => Liquid::Lava,
                _ => continue,
            };
            let (tx, ty) = (x as f32 * TILE_WIDTH, y as f32 * TILE_HEIGHT);
            if !obj.overlay_collision_area(tx, ty, TILE_WIDTH, TILE_HEIGHT) {
                continue;
            }
            match liquid {
                Liquid::Water => touched.0 |= obj.water_collision(tx, ty, TILE_WIDTH, TILE_HEIGHT, event),
                Liquid::Lava => touched.1 |= obj.lava_collision(tx, ty, TILE_WIDTH, TILE_HEIGHT, event),
            }
        }
    }
    touched
}

fn hitbox_bounds<O: GameObject + ?Sized>(obj: &O) -> (f32, f32, f32, f32) {
    obj.core().hitbox.bounds_at(obj.position())
}

fn overlaps<A: GameObject + ?Sized, B: GameObject + ?Sized>(a: &A, b: &B) -> bool {
    let hitbox: Rect = a.core().hitbox;
    hitbox.overlaps(a.position(), &b.core().hitbox, b.position())
}
