/// Entities built on the collision core: Player, Enemy, Bullet, Platform.
///
/// Each one is a thin consumer of `GameObject` / `CollisionObject`: it sets
/// its target speed in `update_event`, lets the core integrate and resolve
/// terrain, and reacts through the collision hooks.

use crate::config::PhysicsConfig;
use crate::domain::camera::Camera;
use crate::domain::collision::{CollisionBody, CollisionObject, Segment, WALL_RIGHT};
use crate::domain::math::{Rect, Vector};
use crate::domain::object::{Canvas, FrameEvent, GameObject, ObjectCore, Paint};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

pub const PLAYER_HEALTH: i32 = 6;
const HURT_INVULNERABILITY: f32 = 60.0;  // ticks
const FIRE_COOLDOWN: f32 = 12.0;
const PLAYER_DEATH_TICKS: f32 = 45.0;
const WATER_DRAG: f32 = 0.5;
const SWIM_KICK: f32 = 0.7;              // fraction of jump speed
const HURT_KNOCKBACK: f32 = 1.5;
const STOMP_BOUNCE: f32 = 2.5;

#[derive(Clone, Debug)]
pub struct Player {
    core: ObjectCore,
    body: CollisionBody,
    physics: PhysicsConfig,
    pub facing: Facing,
    pub health: i32,
    invulnerable: f32,
    fire_cooldown: f32,
    death_timer: f32,
    in_water: bool,      // set by this frame's water check
    submerged: bool,     // last frame's water state, used for movement
    pending_shot: bool,
    pub reached_exit: bool,
}

impl Player {
    pub fn new(pos: Vector, physics: PhysicsConfig) -> Self {
        let mut core = ObjectCore::default();
        core.hitbox = Rect::centered(10.0, 14.0);
        core.camera_check_area = Vector::new(16.0, 16.0);
        let mut body = CollisionBody::with_box(Rect::centered(12.0, 16.0));
        body.bounce_factor = Vector::new(0.0, physics.bounce);

        let mut player = Player {
            core,
            body,
            physics,
            facing: Facing::Right,
            health: PLAYER_HEALTH,
            invulnerable: 0.0,
            fire_cooldown: 0.0,
            death_timer: 0.0,
            in_water: false,
            submerged: false,
            pending_shot: false,
            reached_exit: false,
        };
        player.respawn(pos);
        player
    }

    pub fn respawn(&mut self, pos: Vector) {
        self.core.respawn(pos);
        self.core.in_camera = true;
        self.core.friction = Vector::new(self.physics.walk_friction, self.physics.gravity);
        self.core.target = Vector::new(0.0, self.physics.max_fall);
        self.body.touch_surface = false;
        self.body.steepness_factor = 0.0;
        self.health = PLAYER_HEALTH;
        self.invulnerable = HURT_INVULNERABILITY;
        self.death_timer = 0.0;
        self.in_water = false;
        self.submerged = false;
        self.pending_shot = false;
        self.reached_exit = false;
    }

    /// Muzzle position and direction of a shot requested this frame.
    pub fn take_shot(&mut self) -> Option<(Vector, f32)> {
        if !std::mem::take(&mut self.pending_shot) {
            return None;
        }
        let dir = self.facing.sign();
        Some((self.core.pos + Vector::new(dir * 8.0, 0.0), dir))
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0.0
    }

    pub fn is_submerged(&self) -> bool {
        self.submerged
    }

    /// Bounce off an enemy that was landed on.
    pub fn stomp_bounce(&mut self) {
        self.core.speed.y = -STOMP_BOUNCE;
    }
}

impl GameObject for Player {
    fn core(&self) -> &ObjectCore { &self.core }
    fn core_mut(&mut self) -> &mut ObjectCore { &mut self.core }

    fn update_event(&mut self, event: &FrameEvent) {
        let input = event.input;
        let tick = event.tick;

        self.submerged = std::mem::take(&mut self.in_water);
        self.invulnerable = (self.invulnerable - tick).max(0.0);
        self.fire_cooldown = (self.fire_cooldown - tick).max(0.0);

        let h = input.horizontal();
        if h < 0.0 {
            self.facing = Facing::Left;
        } else if h > 0.0 {
            self.facing = Facing::Right;
        }
        self.body.dir = self.facing.sign();

        let drag = if self.submerged { WATER_DRAG } else { 1.0 };
        let p = &self.physics;
        let slope = self.compute_slope_speed_factor();
        self.core.target = Vector::new(h * p.walk_speed * slope * drag, p.max_fall * drag);
        self.core.friction = Vector::new(p.walk_friction, p.gravity * drag);

        let grounded = self.body.touch_surface;
        if input.jump_pressed && (grounded || self.submerged) {
            let kick = if self.submerged { SWIM_KICK } else { 1.0 };
            self.core.speed.y = -p.jump_speed * kick;
        }
        if !input.jump_held && self.core.speed.y < -p.jump_speed / 2.0 {
            self.core.speed.y = -p.jump_speed / 2.0;
        }

        if input.fire_pressed && self.fire_cooldown <= 0.0 {
            self.pending_shot = true;
            self.fire_cooldown = FIRE_COOLDOWN;
        }
    }

    fn die(&mut self, event: &FrameEvent) -> bool {
        self.death_timer += event.tick;
        self.death_timer >= PLAYER_DEATH_TICKS
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        if !self.should_draw() {
            return;
        }
        let blink = self.is_invulnerable() && (self.invulnerable as i32 / 4) % 2 == 1;
        let paint = if self.is_dying() || blink { Paint::Faded } else { Paint::Hero };
        canvas.draw_glyph(self.core.pos.x, self.core.pos.y, '@', paint);
    }
}

impl CollisionObject for Player {
    fn body(&self) -> &CollisionBody { &self.body }
    fn body_mut(&mut self) -> &mut CollisionBody { &mut self.body }

    fn hurt_collision(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, damage: i32, _event: &FrameEvent) -> bool {
        if !self.is_active() || self.is_invulnerable() {
            return false;
        }
        self.health -= damage;
        self.invulnerable = HURT_INVULNERABILITY;
        self.core.speed.y = -HURT_KNOCKBACK;
        if self.health <= 0 {
            self.kill();
        }
        true
    }

    fn water_collision(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _event: &FrameEvent) -> bool {
        self.in_water = true;
        true
    }

    fn lava_collision(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _event: &FrameEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        self.health = 0;
        self.kill();
        true
    }

    /// Leaving through the right edge finishes the stage.
    fn screen_transition_event(&mut self, _x: f32, direction: f32, _event: &FrameEvent) -> bool {
        if direction == WALL_RIGHT {
            self.reached_exit = true;
            return true;
        }
        false
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies: tagged registry + factory table
// ══════════════════════════════════════════════════════════════

const WALKER_SPEED: f32 = 0.5;
const HOPPER_SPEED: f32 = 0.75;
const HOPPER_JUMP: f32 = 2.5;
const HOPPER_REST: f32 = 40.0;
const FLOATER_SPEED: Vector = Vector { x: 0.5, y: 0.35 };
const ENEMY_GRAVITY: f32 = 0.15;
const ENEMY_MAX_FALL: f32 = 4.0;
pub const ENEMY_DEATH_TICKS: f32 = 20.0;
const ENEMY_SIZE: f32 = 14.0;
/// How far past the leading foot a walker looks for floor.
const LEDGE_LOOKAHEAD: f32 = 2.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum EnemyKind {
    /// Walks until it hits a wall or a ledge, then turns around.
    Walker,
    /// Hops forward whenever it has rested on a floor.
    Hopper,
    /// Drifts diagonally, bouncing off every surface.
    Floater,
}

type EnemyFactory = fn(Vector) -> Enemy;

/// Indexed by `EnemyKind as usize`.
const ENEMY_FACTORIES: [EnemyFactory; 3] = [Enemy::walker, Enemy::hopper, Enemy::floater];

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Walker, EnemyKind::Hopper, EnemyKind::Floater];

    /// Registry lookup by level id (1-based).
    pub fn from_id(id: u8) -> Option<EnemyKind> {
        EnemyKind::ALL.get((id as usize).checked_sub(1)?).copied()
    }

    pub fn id(self) -> u8 {
        self as u8 + 1
    }

    pub fn spawn(self, pos: Vector) -> Enemy {
        ENEMY_FACTORIES[self as usize](pos)
    }

    pub fn glyph(self) -> char {
        match self {
            EnemyKind::Walker => 'W',
            EnemyKind::Hopper => 'H',
            EnemyKind::Floater => 'F',
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    core: ObjectCore,
    body: CollisionBody,
    kind: EnemyKind,
    hop_timer: f32,
    death_timer: f32,
}

impl Default for Enemy {
    fn default() -> Self {
        Enemy {
            core: ObjectCore::default(),
            body: CollisionBody::with_box(Rect::centered(ENEMY_SIZE, ENEMY_SIZE)),
            kind: EnemyKind::Walker,
            hop_timer: 0.0,
            death_timer: 0.0,
        }
    }
}

impl Enemy {
    fn base(kind: EnemyKind, pos: Vector) -> Enemy {
        let mut e = Enemy { kind, ..Enemy::default() };
        e.core.respawn(pos);
        e.core.hitbox = Rect::centered(ENEMY_SIZE, ENEMY_SIZE);
        e.core.camera_check_area = Vector::new(48.0, 48.0);
        e.core.friction = Vector::new(0.1, ENEMY_GRAVITY);
        e.core.target = Vector::new(0.0, ENEMY_MAX_FALL);
        e.body.dir = -1.0;
        e
    }

    fn walker(pos: Vector) -> Enemy {
        Enemy::base(EnemyKind::Walker, pos)
    }

    fn hopper(pos: Vector) -> Enemy {
        let mut e = Enemy::base(EnemyKind::Hopper, pos);
        e.hop_timer = HOPPER_REST;
        e
    }

    fn floater(pos: Vector) -> Enemy {
        let mut e = Enemy::base(EnemyKind::Floater, pos);
        e.core.speed = Vector::new(-FLOATER_SPEED.x, FLOATER_SPEED.y);
        e.core.target = e.core.speed;
        e.core.friction = Vector::ZERO;
        e.body.bounce_factor = Vector::new(1.0, 1.0);
        e
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Point just ahead of and below the leading foot of a grounded walker.
    /// `None` for other kinds, in the air or while riding a platform.
    pub fn foot_ahead(&self) -> Option<Vector> {
        if self.kind != EnemyKind::Walker || !self.is_active() || !self.body.touch_surface {
            return None;
        }
        if self.core.reference.is_some() {
            return None;
        }
        let half = ENEMY_SIZE / 2.0 + LEDGE_LOOKAHEAD;
        Some(self.core.pos + Vector::new(self.body.dir * half, half))
    }

    pub fn turn_around(&mut self) {
        self.body.dir = -self.body.dir;
    }

    /// Remaining size fraction of the death animation.
    pub fn death_scale(&self) -> f32 {
        (1.0 - self.death_timer / ENEMY_DEATH_TICKS).clamp(0.0, 1.0)
    }
}

impl GameObject for Enemy {
    fn core(&self) -> &ObjectCore { &self.core }
    fn core_mut(&mut self) -> &mut ObjectCore { &mut self.core }

    fn update_event(&mut self, event: &FrameEvent) {
        match self.kind {
            EnemyKind::Walker => {
                self.core.target.x = self.body.dir * WALKER_SPEED * self.compute_slope_speed_factor();
            }
            EnemyKind::Hopper => {
                if self.body.touch_surface {
                    self.core.target.x = 0.0;
                    self.hop_timer -= event.tick;
                    if self.hop_timer <= 0.0 {
                        self.core.speed.y = -HOPPER_JUMP;
                        self.hop_timer = HOPPER_REST;
                    }
                } else {
                    self.core.target.x = self.body.dir * HOPPER_SPEED;
                }
            }
            EnemyKind::Floater => {}
        }
    }

    fn die(&mut self, event: &FrameEvent) -> bool {
        self.death_timer += event.tick;
        self.death_timer >= ENEMY_DEATH_TICKS
    }

    fn camera_event(&mut self, _camera: &Camera, _event: &FrameEvent) {
        if self.is_dying() {
            self.force_kill();
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        if !self.should_draw() {
            return;
        }
        let pos = self.core.pos;
        if self.is_dying() {
            let s = ENEMY_SIZE * self.death_scale();
            canvas.fill_rect(pos.x - s / 2.0, pos.y - s / 2.0, s, s, Paint::Faded);
        } else {
            canvas.draw_glyph(pos.x, pos.y, self.kind.glyph(), Paint::Enemy);
        }
    }
}

impl CollisionObject for Enemy {
    fn body(&self) -> &CollisionBody { &self.body }
    fn body_mut(&mut self) -> &mut CollisionBody { &mut self.body }

    fn wall_collision_event(&mut self, direction: f32, _event: &FrameEvent) {
        if self.kind != EnemyKind::Floater {
            self.body.dir = -direction;
        }
    }

    fn lava_collision(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _event: &FrameEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        self.kill();
        true
    }
}

// ══════════════════════════════════════════════════════════════
// Bullet
// ══════════════════════════════════════════════════════════════

const BULLET_SPEED: f32 = 4.0;
const BULLET_LIFETIME: f32 = 60.0;

#[derive(Clone, Debug)]
pub struct Bullet {
    core: ObjectCore,
    body: CollisionBody,
    life: f32,
}

impl Default for Bullet {
    fn default() -> Self {
        let mut body = CollisionBody::with_box(Rect::centered(4.0, 4.0));
        body.check_vertical_slope = true;
        body.ignore_bottom_layer = true;
        let mut core = ObjectCore::default();
        core.hitbox = Rect::centered(4.0, 4.0);
        core.camera_check_area = Vector::new(4.0, 4.0);
        Bullet { core, body, life: 0.0 }
    }
}

impl Bullet {
    /// (Re)launch from `pos` towards `dir` (-1 or 1).
    pub fn fire(&mut self, pos: Vector, dir: f32) {
        self.core.respawn(pos);
        self.core.in_camera = true;
        self.core.speed = Vector::new(dir * BULLET_SPEED, 0.0);
        self.core.target = self.core.speed;
        self.core.friction = Vector::ZERO;
        self.body.dir = dir;
        self.life = BULLET_LIFETIME;
    }
}

impl GameObject for Bullet {
    fn core(&self) -> &ObjectCore { &self.core }
    fn core_mut(&mut self) -> &mut ObjectCore { &mut self.core }

    fn update_event(&mut self, event: &FrameEvent) {
        self.life -= event.tick;
        if self.life <= 0.0 {
            self.kill();
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        if self.should_draw() && !self.is_dying() {
            canvas.draw_glyph(self.core.pos.x, self.core.pos.y, '*', Paint::Projectile);
        }
    }
}

impl CollisionObject for Bullet {
    fn body(&self) -> &CollisionBody { &self.body }
    fn body_mut(&mut self) -> &mut CollisionBody { &mut self.body }

    fn slope_collision_event(&mut self, _direction: f32, _event: &FrameEvent) {
        self.kill();
    }

    fn wall_collision_event(&mut self, _direction: f32, _event: &FrameEvent) {
        self.kill();
    }
}

// ══════════════════════════════════════════════════════════════
// Moving platform
// ══════════════════════════════════════════════════════════════

const PLATFORM_WIDTH: f32 = 32.0;
const PLATFORM_HEIGHT: f32 = 8.0;
const PLATFORM_SPEED: f32 = 0.5;
const PLATFORM_RANGE: f32 = 32.0;

/// One-way platform on a fixed back-and-forth path. Objects standing on it
/// get its speed as their reference link.
#[derive(Clone, Debug)]
pub struct Platform {
    core: ObjectCore,
    origin: Vector,
    vertical: bool,
}

impl Platform {
    pub fn new(pos: Vector, vertical: bool) -> Self {
        let mut core = ObjectCore::spawned_at(pos);
        core.hitbox = Rect::centered(PLATFORM_WIDTH, PLATFORM_HEIGHT);
        core.camera_check_area = Vector::new(PLATFORM_WIDTH + 2.0 * PLATFORM_RANGE, PLATFORM_HEIGHT + 2.0 * PLATFORM_RANGE);
        core.speed = if vertical {
            Vector::new(0.0, -PLATFORM_SPEED)
        } else {
            Vector::new(PLATFORM_SPEED, 0.0)
        };
        Platform { core, origin: pos, vertical }
    }

    /// The walkable top edge.
    pub fn top_segment(&self) -> Segment {
        let (l, t, r, _) = self.core.hitbox.bounds_at(self.core.pos);
        Segment::horizontal(l, r, t)
    }

    pub fn carry_speed(&self) -> Vector {
        self.core.speed
    }
}

impl GameObject for Platform {
    fn core(&self) -> &ObjectCore { &self.core }
    fn core_mut(&mut self) -> &mut ObjectCore { &mut self.core }

    fn update_movement(&mut self, event: &FrameEvent) {
        let core = &mut self.core;
        core.pos += core.speed * event.tick;

        let (offset, speed) = if self.vertical {
            (core.pos.y - self.origin.y, &mut core.speed.y)
        } else {
            (core.pos.x - self.origin.x, &mut core.speed.x)
        };
        let turn = if offset >= PLATFORM_RANGE {
            Some(-PLATFORM_SPEED)
        } else if offset <= -PLATFORM_RANGE {
            Some(PLATFORM_SPEED)
        } else {
            None
        };
        if let Some(s) = turn {
            *speed = s;
            let clamped = offset.clamp(-PLATFORM_RANGE, PLATFORM_RANGE);
            if self.vertical {
                core.pos.y = self.origin.y + clamped;
            } else {
                core.pos.x = self.origin.x + clamped;
            }
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        if !self.should_draw() {
            return;
        }
        let (l, t, r, b) = self.core.hitbox.bounds_at(self.core.pos);
        canvas.fill_rect(l, t, r - l, b - t, Paint::Platform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collision::{SlopeMargins, FLOOR, WALL_LEFT};
    use crate::domain::object::FrameInput;

    fn ev() -> FrameEvent {
        FrameEvent::new(1.0)
    }

    fn with_input(input: FrameInput) -> FrameEvent {
        FrameEvent::with_input(1.0, input)
    }

    fn player() -> Player {
        let mut p = Player::new(Vector::new(100.0, 100.0), PhysicsConfig::default());
        p.invulnerable = 0.0;
        p
    }

    // ── registry ──

    #[test]
    fn registry_maps_ids_to_kinds() {
        assert_eq!(EnemyKind::from_id(1), Some(EnemyKind::Walker));
        assert_eq!(EnemyKind::from_id(3), Some(EnemyKind::Floater));
        assert_eq!(EnemyKind::from_id(0), None);
        assert_eq!(EnemyKind::from_id(4), None);
        for kind in EnemyKind::ALL {
            assert_eq!(EnemyKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn factory_table_builds_the_requested_kind() {
        for kind in EnemyKind::ALL {
            let e = kind.spawn(Vector::new(10.0, 20.0));
            assert_eq!(e.kind(), kind);
            assert!(e.does_exist());
            assert_eq!(e.position(), Vector::new(10.0, 20.0));
        }
        let f = EnemyKind::Floater.spawn(Vector::ZERO);
        assert_eq!(f.body().bounce_factor, Vector::new(1.0, 1.0));
    }

    // ── enemies ──

    #[test]
    fn walker_turns_around_at_walls() {
        let mut e = EnemyKind::Walker.spawn(Vector::new(20.0, 8.0));
        e.core.in_camera = true;
        e.core.old_pos = Vector::new(20.0, 8.0);
        e.core.pos = Vector::new(18.0, 8.0);
        e.core.speed = Vector::new(-0.5, 0.0);
        assert!(e.wall_collision(10.0, 0.0, 16.0, WALL_LEFT, &ev()));
        assert_eq!(e.body.dir, 1.0);
        e.update(&ev());
        assert!(e.core.target.x > 0.0);
    }

    #[test]
    fn grounded_walker_looks_ahead_of_its_leading_foot() {
        let mut e = EnemyKind::Walker.spawn(Vector::new(40.0, 25.0));
        e.core.in_camera = true;
        assert_eq!(e.foot_ahead(), None);

        e.body.touch_surface = true;
        assert_eq!(e.foot_ahead(), Some(Vector::new(31.0, 34.0)));
        e.turn_around();
        assert_eq!(e.foot_ahead(), Some(Vector::new(49.0, 34.0)));

        e.core.reference = Some(Vector::new(0.5, 0.0));
        assert_eq!(e.foot_ahead(), None);
        let mut f = EnemyKind::Floater.spawn(Vector::new(40.0, 25.0));
        f.core.in_camera = true;
        f.body.touch_surface = true;
        assert_eq!(f.foot_ahead(), None);
    }

    #[test]
    fn hopper_jumps_after_resting() {
        let mut e = EnemyKind::Hopper.spawn(Vector::ZERO);
        e.core.in_camera = true;
        e.body.touch_surface = true;
        for _ in 0..(HOPPER_REST as usize - 1) {
            e.update_event(&ev());
            assert!(e.core.speed.y >= 0.0);
        }
        e.update_event(&ev());
        assert_eq!(e.core.speed.y, -HOPPER_JUMP);
    }

    #[test]
    fn floater_keeps_its_speed_and_bounces() {
        let mut e = EnemyKind::Floater.spawn(Vector::new(8.0, 8.0));
        e.core.in_camera = true;
        let before = e.core.speed;
        e.update(&ev());
        assert_eq!(e.core.speed, before);

        e.core.old_pos = Vector::new(8.0, 0.0);
        e.core.pos = Vector::new(8.0, 3.0);
        assert!(e.slope_collision(Segment::horizontal(0.0, 16.0, 10.0), FLOOR, &ev(), SlopeMargins::default(), None));
        assert_eq!(e.core.speed.y, -before.y);
    }

    #[test]
    fn enemy_death_shrinks_then_finishes() {
        let mut e = EnemyKind::Walker.spawn(Vector::ZERO);
        e.core.in_camera = true;
        e.kill();
        for _ in 0..(ENEMY_DEATH_TICKS as usize - 1) {
            e.update(&ev());
            assert!(e.does_exist());
        }
        assert!(e.death_scale() < 0.1);
        e.update(&ev());
        assert!(!e.does_exist());
    }

    #[test]
    fn dying_enemy_reentering_camera_is_removed() {
        let mut e = EnemyKind::Walker.spawn(Vector::new(50.0, 50.0));
        e.kill();
        e.camera_check(&Camera::new(100.0, 100.0), &ev());
        assert!(!e.does_exist());
    }

    // ── bullet ──

    #[test]
    fn bullet_dies_on_first_wall() {
        let mut b = Bullet::default();
        b.fire(Vector::new(0.0, 8.0), 1.0);
        b.update(&ev());
        assert_eq!(b.position().x, BULLET_SPEED);
        assert!(b.wall_collision(5.0, 0.0, 16.0, WALL_RIGHT, &ev()));
        assert!(b.is_dying());
        b.update(&ev());
        assert!(!b.does_exist());
    }

    #[test]
    fn bullet_expires() {
        let mut b = Bullet::default();
        b.fire(Vector::ZERO, -1.0);
        for _ in 0..(BULLET_LIFETIME as usize + 1) {
            b.update(&ev());
        }
        assert!(!b.does_exist());
    }

    // ── platform ──

    #[test]
    fn platform_reverses_at_range_ends() {
        let mut p = Platform::new(Vector::new(100.0, 50.0), false);
        p.core.in_camera = true;
        let steps = (PLATFORM_RANGE / PLATFORM_SPEED) as usize;
        for _ in 0..steps {
            p.update(&ev());
        }
        assert_eq!(p.position().x, 100.0 + PLATFORM_RANGE);
        assert_eq!(p.carry_speed().x, -PLATFORM_SPEED);
        assert_eq!(p.top_segment(), Segment::horizontal(116.0, 148.0, 46.0));
    }

    // ── player ──

    #[test]
    fn player_jumps_only_from_ground() {
        let mut p = player();
        let jump = FrameInput { jump_pressed: true, jump_held: true, ..Default::default() };
        p.update_event(&with_input(jump));
        assert_eq!(p.core.speed.y, 0.0);

        p.body.touch_surface = true;
        p.update_event(&with_input(jump));
        assert_eq!(p.core.speed.y, -p.physics.jump_speed);
    }

    #[test]
    fn releasing_jump_cuts_the_rise() {
        let mut p = player();
        p.core.speed.y = -3.0;
        p.update_event(&with_input(FrameInput::default()));
        assert_eq!(p.core.speed.y, -p.physics.jump_speed / 2.0);
    }

    #[test]
    fn walking_uses_slope_factor() {
        let mut p = player();
        p.body.touch_surface = true;
        p.body.steepness_factor = -1.0;
        let right = FrameInput { right: true, ..Default::default() };
        p.update_event(&with_input(right));
        assert!((p.core.target.x - 0.9 * p.physics.walk_speed).abs() < 1e-6);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn hurt_grants_invulnerability() {
        let mut p = player();
        assert!(p.hurt_collision(0.0, 0.0, 1.0, 1.0, 2, &ev()));
        assert_eq!(p.health, PLAYER_HEALTH - 2);
        assert!(!p.hurt_collision(0.0, 0.0, 1.0, 1.0, 2, &ev()));
        assert_eq!(p.health, PLAYER_HEALTH - 2);
    }

    #[test]
    fn lava_kills_and_death_animation_runs() {
        let mut p = player();
        assert!(p.lava_collision(0.0, 0.0, 16.0, 16.0, &ev()));
        assert!(p.is_dying());
        for _ in 0..PLAYER_DEATH_TICKS as usize {
            p.update(&ev());
        }
        assert!(!p.does_exist());
    }

    #[test]
    fn water_slows_movement_next_frame() {
        let mut p = player();
        p.water_collision(0.0, 0.0, 16.0, 16.0, &ev());
        let right = FrameInput { right: true, ..Default::default() };
        p.update_event(&with_input(right));
        assert!(p.is_submerged());
        assert_eq!(p.core.target.x, p.physics.walk_speed * WATER_DRAG);
        p.update_event(&with_input(right));
        assert!(!p.is_submerged());
    }

    #[test]
    fn fire_has_cooldown() {
        let mut p = player();
        let fire = FrameInput { fire_pressed: true, ..Default::default() };
        p.update_event(&with_input(fire));
        assert!(p.take_shot().is_some());
        assert!(p.take_shot().is_none());
        p.update_event(&with_input(fire));
        assert!(p.take_shot().is_none());
    }

    #[test]
    fn right_edge_is_the_exit() {
        let mut p = player();
        assert!(!p.screen_transition_event(0.0, WALL_LEFT, &ev()));
        assert!(p.screen_transition_event(320.0, WALL_RIGHT, &ev()));
        assert!(p.reached_exit);
    }
}
