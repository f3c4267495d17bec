/// 2D primitives shared by every moving object.
///
/// `Vector` is a plain copyable point/velocity. `Rect` is a *center-offset*
/// box: `(x, y)` is the offset from the owner's position to the box center,
/// `(w, h)` are the full width and height.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vector { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance_to(self, other: Vector) -> f32 {
        (other - self).length()
    }

    /// Unit vector from `self` towards `other`. Zero if the points coincide.
    pub fn direction_to(self, other: Vector) -> Vector {
        (other - self).normalized()
    }

    pub fn normalized(self) -> Vector {
        let len = self.length();
        if len < f32::EPSILON {
            return Vector::ZERO;
        }
        Vector::new(self.x / len, self.y / len)
    }

    pub fn scale(self, s: f32) -> Vector {
        Vector::new(self.x * s, self.y * s)
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;
    fn mul(self, s: f32) -> Vector {
        self.scale(s)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

/// Center-offset axis-aligned box. Invariant: `w >= 0 && h >= 0`.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w: w.max(0.0), h: h.max(0.0) }
    }

    /// Box of size `w × h` centered on the owner's position.
    pub fn centered(w: f32, h: f32) -> Self {
        Rect::new(0.0, 0.0, w, h)
    }

    /// World-space box `(left, top, right, bottom)` for an owner at `pos`.
    pub fn bounds_at(&self, pos: Vector) -> (f32, f32, f32, f32) {
        let cx = pos.x + self.x;
        let cy = pos.y + self.y;
        (cx - self.w / 2.0, cy - self.h / 2.0, cx + self.w / 2.0, cy + self.h / 2.0)
    }

    /// Do the boxes of two owners overlap?
    pub fn overlaps(&self, pos: Vector, other: &Rect, other_pos: Vector) -> bool {
        let (l1, t1, r1, b1) = self.bounds_at(pos);
        let (l2, t2, r2, b2) = other.bounds_at(other_pos);
        overlap_aabb(l1, t1, r1 - l1, b1 - t1, l2, t2, r2 - l2, b2 - t2)
    }
}

/// Strict overlap of two top-left based boxes. Touching edges do not overlap.
#[inline]
pub fn overlap_aabb(
    x1: f32, y1: f32, w1: f32, h1: f32,
    x2: f32, y2: f32, w2: f32, h2: f32,
) -> bool {
    x1 + w1 > x2 && x1 < x2 + w2 && y1 + h1 > y2 && y1 < y2 + h2
}

/// Move `speed` towards `target` by at most `step`, never overshooting.
#[inline]
pub fn update_speed_axis(speed: f32, target: f32, step: f32) -> f32 {
    if speed < target {
        (speed + step).min(target)
    } else {
        (speed - step).max(target)
    }
}
