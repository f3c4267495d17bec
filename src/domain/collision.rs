/// Collision objects: swept slope and wall resolution against line segments.
///
/// The tile map (and anything else that acts as terrain, like moving
/// platforms) reduces its geometry to two primitives:
///
///   - `slope_collision`: a possibly inclined floor (`FLOOR`) or ceiling
///     (`CEILING`) segment, tested against the object's bottom or top edge.
///   - `wall_collision`: a vertical segment blocking rightward (`WALL_RIGHT`)
///     or leftward (`WALL_LEFT`) motion, tested against the side edge.
///
/// ## Swept test
///
/// Both primitives compare the object's edge this frame *and* last frame
/// (`old_pos`) against the line. A hit needs the edge to be at or past the
/// line now (with a `near` tolerance) and to have been before it last frame
/// (with a `far` tolerance that grows with the object's speed). Tolerances
/// are per tick, so the test behaves the same at any frame rate and catches
/// fast objects without continuous collision detection.

use super::math::{overlap_aabb, Rect, Vector};
use super::object::{FrameEvent, GameObject};

pub const FLOOR: f32 = 1.0;
pub const CEILING: f32 = -1.0;
pub const WALL_RIGHT: f32 = 1.0;
pub const WALL_LEFT: f32 = -1.0;

const EPS: f32 = 0.0001;

const WALL_NEAR_MARGIN: f32 = 1.0;
const WALL_FAR_MARGIN: f32 = 4.0;

/// Uphill slowdown and downhill speedup at 45°.
const SLOPE_SLOWDOWN: f32 = 0.10;
const SLOPE_SPEEDUP: f32 = 0.20;

/// A line segment in world space.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Segment {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Segment { x1, y1, x2, y2 }
    }

    pub fn horizontal(x1: f32, x2: f32, y: f32) -> Self {
        Segment::new(x1, y, x2, y)
    }

    pub fn reversed(self) -> Self {
        Segment::new(self.x2, self.y2, self.x1, self.y1)
    }
}

/// Tolerances for `slope_collision`.
///
/// `left`/`right` widen the horizontal range test by that many half box
/// widths (0 = only the box center counts). `near`/`far` are the swept-test
/// tolerances, in units per tick. Floors add the drop of the line under a
/// moving object to `near`, far adds the object's speed.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SlopeMargins {
    pub left: f32,
    pub right: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for SlopeMargins {
    fn default() -> Self {
        SlopeMargins { left: 1.0, right: 1.0, near: 1.0, far: 4.0 }
    }
}

impl SlopeMargins {
    pub fn with_sides(self, left: f32, right: f32) -> Self {
        SlopeMargins { left, right, ..self }
    }

    pub fn with_safety(self, near: f32, far: f32) -> Self {
        SlopeMargins { near, far, ..self }
    }
}

/// Terrain-collision state of an object.
#[derive(Clone, Debug)]
pub struct CollisionBody {
    /// Box tested against terrain. Independent from the hitbox.
    pub collision_box: Rect,
    /// Circle used for object-object separation.
    pub collision_radius: f32,
    pub take_collisions: bool,
    /// Skip tiles that carry the bottom-layer marker.
    pub ignore_bottom_layer: bool,
    /// Skip horizontal floor and ceiling segments.
    pub ignore_even_slopes: bool,
    /// Treat inclined segments as walls.
    pub check_vertical_slope: bool,
    /// Per-axis restitution: 0 stops dead, 1 bounces back at full speed.
    pub bounce_factor: Vector,
    /// A floor collision resolved since the last `reset_contact`.
    pub touch_surface: bool,
    /// dy/dx of the most recent floor collision.
    pub steepness_factor: f32,
    /// Facing sign. Meaning is up to the owner.
    pub dir: f32,
}

impl Default for CollisionBody {
    fn default() -> Self {
        CollisionBody {
            collision_box: Rect::centered(16.0, 16.0),
            collision_radius: 8.0,
            take_collisions: true,
            ignore_bottom_layer: false,
            ignore_even_slopes: false,
            check_vertical_slope: false,
            bounce_factor: Vector::ZERO,
            touch_surface: false,
            steepness_factor: 0.0,
            dir: 1.0,
        }
    }
}

impl CollisionBody {
    pub fn with_box(collision_box: Rect) -> Self {
        CollisionBody {
            collision_radius: collision_box.w.max(collision_box.h) / 2.0,
            collision_box,
            ..CollisionBody::default()
        }
    }
}

/// A game object that collides with terrain.
///
/// Hooks default to no-ops; the tile dispatcher calls the hazard hooks on
/// every object and objects that don't care simply don't override them.
pub trait CollisionObject: GameObject {
    fn body(&self) -> &CollisionBody;
    fn body_mut(&mut self) -> &mut CollisionBody;

    // ── Hooks ──

    fn slope_collision_event(&mut self, _direction: f32, _event: &FrameEvent) {}

    fn wall_collision_event(&mut self, _direction: f32, _event: &FrameEvent) {}

    /// Touching a damaging area. Returns true if the hit was taken.
    fn hurt_collision(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _damage: i32, _event: &FrameEvent) -> bool {
        false
    }

    fn water_collision(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _event: &FrameEvent) -> bool {
        false
    }

    fn lava_collision(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _event: &FrameEvent) -> bool {
        false
    }

    /// Crossed the world edge at `x`. Return true to take over (the stage
    /// then skips the edge wall).
    fn screen_transition_event(&mut self, _x: f32, _direction: f32, _event: &FrameEvent) -> bool {
        false
    }

    // ── Provided ──

    fn does_take_collisions(&self) -> bool {
        self.body().take_collisions
    }

    /// Forget last frame's floor contact. Called once per frame before
    /// terrain collisions are resolved.
    fn reset_contact(&mut self) {
        self.body_mut().touch_surface = false;
    }

    fn slope_collision(
        &mut self,
        seg: Segment,
        direction: f32,
        event: &FrameEvent,
        margins: SlopeMargins,
        reference: Option<Vector>,
    ) -> bool {
        if !self.body().take_collisions || !self.is_active() {
            return false;
        }
        if self.body().check_vertical_slope && (seg.y1 - seg.y2).abs() > EPS {
            return self.vertical_slope_collision(seg, direction, event);
        }
        if (seg.x1 - seg.x2).abs() < EPS {
            return false;
        }
        if seg.x1 > seg.x2 {
            return self.slope_collision(seg.reversed(), direction, event, margins, reference);
        }

        let steepness = (seg.y2 - seg.y1) / (seg.x2 - seg.x1);
        if self.body().ignore_even_slopes && steepness.abs() < EPS {
            return false;
        }

        let bx = self.body().collision_box;
        let core = self.core();

        let px = core.pos.x + bx.x;
        let left = px - bx.w / 2.0 * margins.left;
        let right = px + bx.w / 2.0 * margins.right;
        if right < seg.x1 || left >= seg.x2 || core.speed.y * direction < -EPS {
            return false;
        }

        let y0 = seg.y1 + steepness * (px - seg.x1);
        let edge = bx.y + bx.h / 2.0 * direction;
        let py = core.pos.y + edge;
        let old_y = core.old_pos.y + edge;

        // A floor falling away under a walker drops |speed.x * steepness| per tick.
        let follow = if direction > 0.0 { (core.speed.x * steepness).abs() } else { 0.0 };
        let near = (margins.near + follow) * event.tick;
        let far = (margins.far + core.speed.length()) * event.tick;

        let hit = if direction > 0.0 {
            py >= y0 - near && old_y <= y0 + far
        } else {
            py <= y0 + near && old_y >= y0 - far
        };
        if !hit {
            return false;
        }

        let bounce = self.body().bounce_factor.y;
        let core = self.core_mut();
        core.pos.y = y0 - edge;
        core.speed.y *= -bounce;
        if reference.is_some() {
            core.reference = reference;
        }

        if direction > 0.0 {
            let body = self.body_mut();
            body.steepness_factor = steepness;
            body.touch_surface = true;
        }

        self.slope_collision_event(direction, event);
        true
    }

    /// Inclined segments seen as walls, for objects with
    /// `check_vertical_slope` (projectiles). The solid side follows from the
    /// segment's floor/ceiling direction and its incline.
    fn vertical_slope_collision(&mut self, seg: Segment, direction: f32, event: &FrameEvent) -> bool {
        if !self.body().take_collisions || !self.is_active() {
            return false;
        }
        let seg = if seg.x1 > seg.x2 { seg.reversed() } else { seg };
        let dy = seg.y2 - seg.y1;
        if dy.abs() < EPS {
            return false;
        }

        let wall_dir = if (seg.x1 - seg.x2).abs() < EPS {
            direction
        } else {
            direction * (seg.y1 - seg.y2).signum()
        };

        let bx = self.body().collision_box;
        let py = self.core().pos.y + bx.y;
        let (top, bottom) = (seg.y1.min(seg.y2), seg.y1.max(seg.y2));
        if py < top || py > bottom {
            return false;
        }

        let x0 = seg.x1 + (py - seg.y1) * (seg.x2 - seg.x1) / dy;
        resolve_wall(self, x0, wall_dir, event)
    }

    fn wall_collision(&mut self, x: f32, y: f32, height: f32, direction: f32, event: &FrameEvent) -> bool {
        if !self.body().take_collisions || !self.is_active() {
            return false;
        }

        let bx = self.body().collision_box;
        let top = self.core().pos.y + bx.y - bx.h / 2.0;
        let bottom = top + bx.h;
        if bottom <= y || top >= y + height {
            return false;
        }
        resolve_wall(self, x, direction, event)
    }

    /// Horizontal speed multiplier for slope-aware walking: below 1 when
    /// walking uphill, above 1 downhill, exactly 1 off the ground.
    fn compute_slope_speed_factor(&self) -> f32 {
        let body = self.body();
        if !body.touch_surface || body.dir.abs() < EPS {
            return 1.0;
        }
        let along = body.dir.signum() * body.steepness_factor.clamp(-1.0, 1.0);
        if along < 0.0 {
            1.0 - SLOPE_SLOWDOWN * -along
        } else {
            1.0 + SLOPE_SPEEDUP * along
        }
    }

    /// Does the collision box overlap the top-left based area?
    fn overlay_collision_area(&self, x: f32, y: f32, w: f32, h: f32) -> bool {
        let (l, t, r, b) = self.body().collision_box.bounds_at(self.core().pos);
        overlap_aabb(l, t, r - l, b - t, x, y, w, h)
    }

    /// Push this object out of a circle so the two collision circles no
    /// longer overlap. Returns true if a push happened.
    fn push_out_of(&mut self, center: Vector, radius: f32) -> bool {
        if !self.is_active() {
            return false;
        }
        let min_dist = self.body().collision_radius + radius;
        let pos = self.core().pos;
        let dist = pos.distance_to(center);
        if dist >= min_dist {
            return false;
        }
        let away = if dist < EPS { Vector::new(self.body().dir.signum(), 0.0) } else { center.direction_to(pos) };
        self.core_mut().pos = center + away * min_dist;
        true
    }
}

/// Swept test along x for the object's leading side edge, plus the response.
fn resolve_wall<O: CollisionObject + ?Sized>(obj: &mut O, x: f32, direction: f32, event: &FrameEvent) -> bool {
    let bx = obj.body().collision_box;
    let core = obj.core();
    if core.speed.x * direction < -EPS {
        return false;
    }

    let edge = bx.x + bx.w / 2.0 * direction;
    let px = core.pos.x + edge;
    let old_x = core.old_pos.x + edge;
    let near = WALL_NEAR_MARGIN * event.tick;
    let far = (WALL_FAR_MARGIN + core.speed.length()) * event.tick;

    let hit = if direction > 0.0 {
        px >= x - near && old_x <= x + far
    } else {
        px <= x + near && old_x >= x - far
    };
    if !hit {
        return false;
    }

    let bounce = obj.body().bounce_factor.x;
    let core = obj.core_mut();
    core.pos.x = x - edge;
    core.speed.x *= -bounce;

    obj.wall_collision_event(direction, event);
    true
}
