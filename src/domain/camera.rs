/// Camera: the visible window into the world, in world units.
///
/// `(x, y)` is the world position of the top-left visible pixel.
/// `(width, height)` is the visible size. Objects decide whether they are
/// simulated by testing their camera check area against this rectangle.

use super::math::{overlap_aabb, Vector};

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Camera { x: 0.0, y: 0.0, width, height }
    }

    pub fn top_left(&self) -> Vector {
        Vector::new(self.x, self.y)
    }

    /// Does the box centered at `center` with size `area` touch the view?
    pub fn is_visible(&self, center: Vector, area: Vector) -> bool {
        overlap_aabb(
            center.x - area.x / 2.0, center.y - area.y / 2.0, area.x, area.y,
            self.x, self.y, self.width, self.height,
        )
    }

    /// Follow a target with a dead zone covering the inner 60% of the view.
    /// The camera stays inside the world unless the world is smaller than the
    /// view, in which case the world is centered.
    pub fn follow(&mut self, target: Vector, world_w: f32, world_h: f32) {
        let margin_x = self.width / 5.0;
        let margin_y = self.height / 5.0;

        if target.x < self.x + margin_x {
            self.x = target.x - margin_x;
        } else if target.x > self.x + self.width - margin_x {
            self.x = target.x - self.width + margin_x;
        }
        if target.y < self.y + margin_y {
            self.y = target.y - margin_y;
        } else if target.y > self.y + self.height - margin_y {
            self.y = target.y - self.height + margin_y;
        }

        self.clamp_to(world_w, world_h);
    }

    /// Snap directly onto a target (level load, respawn).
    pub fn center_on(&mut self, target: Vector, world_w: f32, world_h: f32) {
        self.x = target.x - self.width / 2.0;
        self.y = target.y - self.height / 2.0;
        self.clamp_to(world_w, world_h);
    }

    fn clamp_to(&mut self, world_w: f32, world_h: f32) {
        self.x = if world_w <= self.width {
            -(self.width - world_w) / 2.0
        } else {
            self.x.clamp(0.0, world_w - self.width)
        };
        self.y = if world_h <= self.height {
            -(self.height - world_h) / 2.0
        } else {
            self.y.clamp(0.0, world_h - self.height)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_uses_area_extent() {
        let cam = Camera::new(100.0, 100.0);
        assert!(cam.is_visible(Vector::new(50.0, 50.0), Vector::new(1.0, 1.0)));
        assert!(cam.is_visible(Vector::new(-4.0, 50.0), Vector::new(16.0, 16.0)));
        assert!(!cam.is_visible(Vector::new(-9.0, 50.0), Vector::new(16.0, 16.0)));
    }

    #[test]
    fn follow_respects_dead_zone() {
        let mut cam = Camera::new(100.0, 100.0);
        cam.follow(Vector::new(50.0, 50.0), 1000.0, 1000.0);
        assert_eq!(cam.top_left(), Vector::ZERO);
        cam.follow(Vector::new(150.0, 50.0), 1000.0, 1000.0);
        assert_eq!(cam.x, 70.0);
    }

    #[test]
    fn small_world_is_centered() {
        let mut cam = Camera::new(100.0, 100.0);
        cam.center_on(Vector::new(10.0, 10.0), 60.0, 200.0);
        assert_eq!(cam.x, -20.0);
        assert_eq!(cam.y, 0.0);
    }
}
