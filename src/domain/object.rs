/// Game objects: shared state, lifecycle and movement integration.
///
/// ## Lifecycle
///
/// Every object is in exactly one of three states:
///
/// | `exist` | `dying` | State    | Per-frame behavior                         |
/// |---------|---------|----------|--------------------------------------------|
/// | false   | -       | Inactive | nothing; slot may be reused by a pool      |
/// | true    | true    | Dying    | `die` until it returns true, no movement   |
/// | true    | false   | Active   | `update_event` → movement → post-movement  |
///
/// On top of that, nothing happens unless the object is `in_camera`.
/// Off-screen objects are frozen, except that a dying object which leaves
/// the camera is finalized at once.
///
/// ## Reference link
///
/// `reference` holds the speed of the surface the object stood on this frame
/// (a moving platform). It is added to the integrated motion and cleared at
/// the end of every `update` call, whichever path the update took.

use super::camera::Camera;
use super::math::{update_speed_axis, Rect, Vector};

/// Input snapshot for one frame. Produced by the input layer, consumed by
/// objects that are player-controlled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub jump_held: bool,
    pub jump_pressed: bool,
    pub fire_pressed: bool,
    pub switch_pressed: bool,
}

impl FrameInput {
    /// Horizontal stick value in {-1, 0, 1}.
    pub fn horizontal(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Per-frame context passed to every hook.
///
/// `tick` is the frame duration relative to a 60 Hz frame (1.0 at 60 fps,
/// 2.0 at 30 fps). Every per-frame rate in the core is multiplied by it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameEvent {
    pub tick: f32,
    pub input: FrameInput,
}

impl FrameEvent {
    pub fn new(tick: f32) -> Self {
        FrameEvent { tick, input: FrameInput::default() }
    }

    pub fn with_input(tick: f32, input: FrameInput) -> Self {
        FrameEvent { tick, input }
    }
}

/// Palette used by draw hooks. The renderer maps these to real colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Paint {
    Hero,
    Enemy,
    Projectile,
    Platform,
    Hazard,
    Faded,
}

/// Drawing surface in world coordinates. The camera offset is the canvas'
/// business, not the object's.
pub trait Canvas {
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: Paint);
    fn draw_glyph(&mut self, x: f32, y: f32, glyph: char, paint: Paint);
}

/// State shared by every game object.
#[derive(Clone, Debug)]
pub struct ObjectCore {
    pub pos: Vector,
    /// Position at the start of the current active update.
    pub old_pos: Vector,
    pub speed: Vector,
    pub target: Vector,
    /// Per-axis ease rate of `speed` towards `target`, per tick.
    pub friction: Vector,
    pub exist: bool,
    pub dying: bool,
    pub in_camera: bool,
    /// Overlap box for attacks and pickups. Not used for terrain.
    pub hitbox: Rect,
    /// Full size of the box tested against the camera view.
    pub camera_check_area: Vector,
    /// Speed of the surface carrying the object this frame.
    pub reference: Option<Vector>,
}

impl Default for ObjectCore {
    fn default() -> Self {
        ObjectCore {
            pos: Vector::ZERO,
            old_pos: Vector::ZERO,
            speed: Vector::ZERO,
            target: Vector::ZERO,
            friction: Vector::new(1.0, 1.0),
            exist: false,
            dying: false,
            in_camera: false,
            hitbox: Rect::default(),
            camera_check_area: Vector::new(32.0, 32.0),
            reference: None,
        }
    }
}

impl ObjectCore {
    /// A fresh, existing object at `pos`.
    pub fn spawned_at(pos: Vector) -> Self {
        let mut core = ObjectCore::default();
        core.respawn(pos);
        core
    }

    /// Re-initialize for reuse: clear motion and flags, mark as existing.
    /// Sizes (hitbox, camera area, friction) are kept.
    pub fn respawn(&mut self, pos: Vector) {
        self.pos = pos;
        self.old_pos = pos;
        self.speed = Vector::ZERO;
        self.target = Vector::ZERO;
        self.exist = true;
        self.dying = false;
        self.in_camera = false;
        self.reference = None;
    }

    /// Ease speed towards target, then move. Applied once per active update.
    pub fn integrate(&mut self, tick: f32) {
        self.speed.x = update_speed_axis(self.speed.x, self.target.x, self.friction.x * tick);
        self.speed.y = update_speed_axis(self.speed.y, self.target.y, self.friction.y * tick);
        self.pos += self.speed * tick;
        if let Some(carry) = self.reference {
            self.pos += carry * tick;
        }
    }
}

/// A simulated entity. Implementors provide access to their [`ObjectCore`]
/// and override whichever hooks they need; the lifecycle methods are
/// provided and should not be overridden.
pub trait GameObject {
    fn core(&self) -> &ObjectCore;
    fn core_mut(&mut self) -> &mut ObjectCore;

    // ── Hooks ──

    /// Per-type logic, run before movement integration.
    fn update_event(&mut self, _event: &FrameEvent) {}

    /// Per-type logic, run after movement integration.
    fn post_movement_event(&mut self, _event: &FrameEvent) {}

    /// Death animation step. Return true when the animation is finished.
    fn die(&mut self, _event: &FrameEvent) -> bool {
        true
    }

    /// Called by `camera_check` when the object has just become visible.
    fn camera_event(&mut self, _camera: &Camera, _event: &FrameEvent) {}

    /// Movement integration. Overridden by objects on fixed paths.
    fn update_movement(&mut self, event: &FrameEvent) {
        self.core_mut().integrate(event.tick);
    }

    /// Render hook. Implementations should bail out unless [`Self::should_draw`].
    fn draw(&self, _canvas: &mut dyn Canvas) {}

    // ── Lifecycle (provided) ──

    fn update(&mut self, event: &FrameEvent) {
        advance_lifecycle(self, event);
        self.core_mut().reference = None;
    }

    fn camera_check(&mut self, camera: &Camera, event: &FrameEvent) {
        if !self.core().exist {
            return;
        }

        let was_visible = self.core().in_camera;
        let visible = {
            let core = self.core();
            camera.is_visible(core.pos, core.camera_check_area)
        };
        self.core_mut().in_camera = visible;

        if visible && !was_visible {
            self.camera_event(camera, event);
        }

        let core = self.core_mut();
        if core.dying && !core.in_camera {
            log::trace!("dying object left camera at {:?}, finalized", core.pos);
            core.dying = false;
            core.exist = false;
        }
    }

    /// The single predicate used to decide whether an object interacts.
    fn is_active(&self) -> bool {
        let core = self.core();
        core.exist && !core.dying && core.in_camera
    }

    fn does_exist(&self) -> bool {
        self.core().exist
    }

    fn is_dying(&self) -> bool {
        self.core().dying
    }

    fn should_draw(&self) -> bool {
        let core = self.core();
        core.exist && core.in_camera
    }

    fn position(&self) -> Vector {
        self.core().pos
    }

    /// Start the death animation. No-op unless active.
    fn kill(&mut self) {
        let core = self.core_mut();
        if core.exist && !core.dying {
            core.dying = true;
        }
    }

    /// Remove immediately, skipping the death animation.
    fn force_kill(&mut self) {
        let core = self.core_mut();
        core.exist = false;
        core.dying = false;
    }

    fn instant_kill(&mut self, _event: &FrameEvent) {
        self.force_kill();
    }
}

fn advance_lifecycle<O: GameObject + ?Sized>(obj: &mut O, event: &FrameEvent) {
    if !obj.core().exist {
        return;
    }

    if !obj.core().in_camera {
        let core = obj.core_mut();
        if core.dying {
            core.dying = false;
            core.exist = false;
        }
        return;
    }

    {
        let core = obj.core_mut();
        core.old_pos = core.pos;
    }

    if obj.core().dying {
        if obj.die(event) {
            let core = obj.core_mut();
            core.exist = false;
            core.dying = false;
        }
        return;
    }

    obj.update_event(event);
    obj.update_movement(event);
    obj.post_movement_event(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal object that counts hook calls.
    #[derive(Default)]
    struct Dummy {
        core: ObjectCore,
        updates: u32,
        post_moves: u32,
        die_calls: u32,
        die_after: u32,
        entered: u32,
    }

    impl Dummy {
        fn at(x: f32, y: f32) -> Self {
            let mut p = Dummy { core: ObjectCore::spawned_at(Vector::new(x, y)), ..Default::default() };
            p.core.in_camera = true;
            p
        }
    }

    impl GameObject for Dummy {
        fn core(&self) -> &ObjectCore { &self.core }
        fn core_mut(&mut self) -> &mut ObjectCore { &mut self.core }

        fn update_event(&mut self, _event: &FrameEvent) {
            self.updates += 1;
        }

        fn post_movement_event(&mut self, _event: &FrameEvent) {
            self.post_moves += 1;
        }

        fn die(&mut self, _event: &FrameEvent) -> bool {
            self.die_calls += 1;
            self.die_calls >= self.die_after
        }

        fn camera_event(&mut self, _camera: &Camera, _event: &FrameEvent) {
            self.entered += 1;
        }
    }

    fn tick() -> FrameEvent {
        FrameEvent::new(1.0)
    }

    // ── update gating ──

    #[test]
    fn inactive_object_is_untouched() {
        let mut p = Dummy::at(0.0, 0.0);
        p.core.exist = false;
        p.core.speed = Vector::new(1.0, 0.0);
        p.core.target = Vector::new(1.0, 0.0);
        p.update(&tick());
        assert_eq!(p.updates, 0);
        assert_eq!(p.core.pos, Vector::ZERO);
    }

    #[test]
    fn off_camera_object_is_frozen() {
        let mut p = Dummy::at(0.0, 0.0);
        p.core.in_camera = false;
        p.core.speed = Vector::new(1.0, 0.0);
        p.core.target = Vector::new(1.0, 0.0);
        p.update(&tick());
        assert_eq!(p.updates, 0);
        assert_eq!(p.core.pos, Vector::ZERO);
        assert!(p.core.exist);
    }

    #[test]
    fn off_camera_dying_object_is_finalized_by_update() {
        let mut p = Dummy::at(0.0, 0.0);
        p.core.in_camera = false;
        p.core.dying = true;
        p.die_after = 100;
        p.update(&tick());
        assert!(!p.core.exist);
        assert!(!p.core.dying);
        assert_eq!(p.die_calls, 0);
    }

    #[test]
    fn active_update_runs_hooks_in_order_and_moves() {
        let mut p = Dummy::at(5.0, 5.0);
        p.core.speed = Vector::new(2.0, 0.0);
        p.core.target = Vector::new(2.0, 0.0);
        p.update(&tick());
        assert_eq!(p.updates, 1);
        assert_eq!(p.post_moves, 1);
        assert_eq!(p.core.old_pos, Vector::new(5.0, 5.0));
        assert_eq!(p.core.pos, Vector::new(7.0, 5.0));
    }

    #[test]
    fn dying_object_runs_death_animation_without_moving() {
        let mut p = Dummy::at(0.0, 0.0);
        p.core.dying = true;
        p.core.speed = Vector::new(3.0, 3.0);
        p.die_after = 2;

        p.update(&tick());
        assert!(p.core.exist);
        assert_eq!(p.core.pos, Vector::ZERO);
        assert_eq!(p.updates, 0);

        p.update(&tick());
        assert!(!p.core.exist);
        assert!(!p.core.dying);
    }

    // ── movement integration ──

    #[test]
    fn speed_eases_linearly_scaled_by_tick() {
        let mut p = Dummy::at(0.0, 0.0);
        p.core.target = Vector::new(1.0, 0.0);
        p.core.friction = Vector::new(0.25, 0.25);
        p.update(&FrameEvent::new(2.0));
        assert_eq!(p.core.speed.x, 0.5);
        assert_eq!(p.core.pos.x, 1.0);
        p.update(&FrameEvent::new(2.0));
        assert_eq!(p.core.speed.x, 1.0);
        p.update(&FrameEvent::new(2.0));
        assert_eq!(p.core.speed.x, 1.0);
    }

    #[test]
    fn reference_carries_object_and_is_cleared() {
        let mut p = Dummy::at(0.0, 0.0);
        p.core.reference = Some(Vector::new(1.5, 0.0));
        p.update(&tick());
        assert_eq!(p.core.pos.x, 1.5);
        assert!(p.core.reference.is_none());
    }

    #[test]
    fn reference_is_cleared_on_every_short_circuit() {
        let mut off = Dummy::at(0.0, 0.0);
        off.core.in_camera = false;
        off.core.reference = Some(Vector::new(1.0, 0.0));
        off.update(&tick());
        assert!(off.core.reference.is_none());

        let mut dead = Dummy::at(0.0, 0.0);
        dead.core.exist = false;
        dead.core.reference = Some(Vector::new(1.0, 0.0));
        dead.update(&tick());
        assert!(dead.core.reference.is_none());

        let mut dying = Dummy::at(0.0, 0.0);
        dying.core.dying = true;
        dying.die_after = 5;
        dying.core.reference = Some(Vector::new(1.0, 0.0));
        dying.update(&tick());
        assert!(dying.core.reference.is_none());
        assert_eq!(dying.core.pos, Vector::ZERO);
    }

    // ── camera check ──

    #[test]
    fn camera_check_is_idempotent() {
        let cam = Camera::new(100.0, 100.0);
        let mut p = Dummy::at(50.0, 50.0);
        p.core.in_camera = false;

        p.camera_check(&cam, &tick());
        p.camera_check(&cam, &tick());
        assert!(p.core.in_camera);
        assert_eq!(p.entered, 1);
    }

    #[test]
    fn leaving_camera_clears_flag_without_event() {
        let cam = Camera::new(100.0, 100.0);
        let mut p = Dummy::at(500.0, 50.0);
        p.camera_check(&cam, &tick());
        assert!(!p.core.in_camera);
        assert_eq!(p.entered, 0);

        p.core.pos.x = 50.0;
        p.camera_check(&cam, &tick());
        assert!(p.core.in_camera);
        assert_eq!(p.entered, 1);
    }

    #[test]
    fn dying_object_leaving_camera_is_finalized_immediately() {
        let cam = Camera::new(100.0, 100.0);
        let mut p = Dummy::at(500.0, 50.0);
        p.core.dying = true;
        p.die_after = 1000;
        p.camera_check(&cam, &tick());
        assert!(!p.core.exist);
        assert!(!p.core.dying);
    }

    #[test]
    fn camera_check_skips_nonexistent() {
        let cam = Camera::new(100.0, 100.0);
        let mut p = Dummy::at(50.0, 50.0);
        p.core.exist = false;
        p.core.in_camera = false;
        p.camera_check(&cam, &tick());
        assert!(!p.core.in_camera);
        assert_eq!(p.entered, 0);
    }

    // ── predicates ──

    #[test]
    fn is_active_requires_all_three_flags() {
        let mut p = Dummy::at(0.0, 0.0);
        assert!(p.is_active());
        p.core.dying = true;
        assert!(!p.is_active());
        p.core.dying = false;
        p.core.in_camera = false;
        assert!(!p.is_active());
        p.core.in_camera = true;
        p.force_kill();
        assert!(!p.is_active());
        assert!(!p.core.dying);
    }

    #[test]
    fn kill_starts_death_only_when_alive() {
        let mut p = Dummy::at(0.0, 0.0);
        p.kill();
        assert!(p.core.dying);
        p.force_kill();
        p.kill();
        assert!(!p.core.dying);
    }
}
