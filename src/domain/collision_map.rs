/// Collision map: per-tile feature masks and per-frame terrain resolution.
///
/// ## Build
///
/// For every tile and every visual layer (`bottom`, `middle`, `top`), the
/// visual tile ID selects one entry in each of the four collision tileset
/// variants (`get_indexed_tile(variant, id - 1)`). Entries at or above
/// `COLLISION_TILE_OFFSET` set feature bit `entry - OFFSET`. A tile that got
/// any bit from its bottom layer also gets the bottom-layer marker.
///
/// ## Query
///
/// `object_collision` scans the 5×5 tiles around the object's tile. Window
/// coordinates are clamped to the map, not skipped: near an edge the border
/// tiles are visited more than once. Every feature of every visited tile is
/// turned into `slope_collision` / `wall_collision` calls on the object.
///
/// ## Patch
///
/// `recompute_collision_tiles` re-derives a sparse set of tiles after their
/// visual IDs changed (color-block switches). Other tiles are untouched.

use thiserror::Error;

use super::collision::{CollisionObject, Segment, SlopeMargins, CEILING, FLOOR, WALL_LEFT, WALL_RIGHT};
use super::object::FrameEvent;
use super::tile::{FeatureMask, TileFeature, COLLISION_TILE_OFFSET, SPIKE_DAMAGE, TILE_HEIGHT, TILE_WIDTH};
use super::tilemap::{Tilemap, TilemapError, COLLISION_VARIANTS, VISUAL_LAYERS};

/// Half-size of the query window, in tiles.
const WINDOW_RADIUS: i32 = 2;

/// Full diagonals snap less eagerly but reach further back than flat edges.
const DIAGONAL_NEAR_MARGIN: f32 = 0.5;
const DIAGONAL_FAR_MARGIN: f32 = 6.0;

/// Length of the corner correction ramps.
const CORRECTION_LENGTH: f32 = 4.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error(transparent)]
    Tilemap(#[from] TilemapError),
    #[error("collision tileset is empty")]
    EmptyTileset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionMap {
    width: usize,
    height: usize,
    tiles: Vec<FeatureMask>,
}

impl CollisionMap {
    /// Build the masks for a whole stage.
    pub fn new(visual: &Tilemap, collision: &Tilemap) -> Result<Self, MapError> {
        visual.require_layers(&VISUAL_LAYERS)?;
        collision.require_layers(&COLLISION_VARIANTS)?;
        if collision.is_empty() {
            return Err(MapError::EmptyTileset);
        }

        let tiles = (0..visual.len())
            .map(|i| derive_mask(visual, collision, i))
            .collect::<Vec<_>>();

        let solid = tiles.iter().filter(|m| !m.is_empty()).count();
        log::debug!(
            "collision map built: {}x{} tiles, {} with features",
            visual.width, visual.height, solid,
        );

        Ok(CollisionMap { width: visual.width, height: visual.height, tiles })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Mask at tile `(x, y)`. Outside the map: empty.
    pub fn mask_at(&self, x: i32, y: i32) -> FeatureMask {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return FeatureMask::EMPTY;
        }
        self.tiles[y as usize * self.width + x as usize]
    }

    /// Re-derive the masks of the given tile indices. Out-of-range indices
    /// are ignored.
    pub fn recompute_collision_tiles(&mut self, visual: &Tilemap, collision: &Tilemap, indices: &[usize]) {
        let mut changed = 0;
        for &i in indices {
            if i >= self.tiles.len() {
                continue;
            }
            let mask = derive_mask(visual, collision, i);
            if mask != self.tiles[i] {
                changed += 1;
            }
            self.tiles[i] = mask;
        }
        log::debug!("recomputed {} collision tiles, {} changed", indices.len(), changed);
    }

    /// Any floor (flat top or floor slope) in the tile column under `x`,
    /// from `y` down to `y + depth`?
    pub fn has_floor_below(&self, x: f32, y: f32, depth: f32) -> bool {
        let tx = (x / TILE_WIDTH).floor() as i32;
        let first = (y / TILE_HEIGHT).floor() as i32;
        let last = ((y + depth) / TILE_HEIGHT).floor() as i32;
        (first..=last).any(|ty| {
            let mask = self.mask_at(tx, ty);
            mask.has(TileFeature::Top) || mask.has_floor_slope()
        })
    }

    /// Resolve terrain collisions for one object this frame.
    pub fn object_collision<O: CollisionObject + ?Sized>(
        &self,
        obj: &mut O,
        event: &FrameEvent,
        ignore_bottom_layer: bool,
    ) {
        if self.tiles.is_empty() || !obj.is_active() || !obj.does_take_collisions() {
            return;
        }

        let pos = obj.position();
        let cx = (pos.x / TILE_WIDTH).floor() as i32;
        let cy = (pos.y / TILE_HEIGHT).floor() as i32;
        let max_x = self.width as i32 - 1;
        let max_y = self.height as i32 - 1;

        for dy in -WINDOW_RADIUS..=WINDOW_RADIUS {
            for dx in -WINDOW_RADIUS..=WINDOW_RADIUS {
                let x = (cx + dx).clamp(0, max_x);
                let y = (cy + dy).clamp(0, max_y);
                let mask = self.mask_at(x, y);
                if mask.is_empty() || (ignore_bottom_layer && mask.has_bottom_layer()) {
                    continue;
                }
                self.tile_collision(obj, x, y, mask, event);
            }
        }
    }

    fn tile_collision<O: CollisionObject + ?Sized>(
        &self,
        obj: &mut O,
        x: i32,
        y: i32,
        mask: FeatureMask,
        event: &FrameEvent,
    ) {
        let x0 = x as f32 * TILE_WIDTH;
        let y0 = y as f32 * TILE_HEIGHT;
        let left_n = self.mask_at(x - 1, y);
        let right_n = self.mask_at(x + 1, y);

        for feature in mask.features() {
            match feature {
                TileFeature::Top => {
                    let m = trimmed(left_n.has_floor_slope(), right_n.has_floor_slope());
                    obj.slope_collision(Segment::horizontal(x0, x0 + TILE_WIDTH, y0), FLOOR, event, m, None);
                }
                TileFeature::Bottom => {
                    let m = trimmed(left_n.has_ceiling_slope(), right_n.has_ceiling_slope());
                    let yb = y0 + TILE_HEIGHT;
                    obj.slope_collision(Segment::horizontal(x0, x0 + TILE_WIDTH, yb), CEILING, event, m, None);
                }
                TileFeature::Left => {
                    obj.wall_collision(x0, y0, TILE_HEIGHT, WALL_RIGHT, event);
                }
                TileFeature::Right => {
                    obj.wall_collision(x0 + TILE_WIDTH, y0, TILE_HEIGHT, WALL_LEFT, event);
                }

                TileFeature::SlopeTopRight => {
                    diagonal(obj, Segment::new(x0, y0 + TILE_HEIGHT, x0 + TILE_WIDTH, y0), FLOOR, event);
                }
                TileFeature::SlopeTopLeft => {
                    diagonal(obj, Segment::new(x0, y0, x0 + TILE_WIDTH, y0 + TILE_HEIGHT), FLOOR, event);
                }
                TileFeature::SlopeBottomRight => {
                    diagonal(obj, Segment::new(x0, y0, x0 + TILE_WIDTH, y0 + TILE_HEIGHT), CEILING, event);
                }
                TileFeature::SlopeBottomLeft => {
                    diagonal(obj, Segment::new(x0, y0 + TILE_HEIGHT, x0 + TILE_WIDTH, y0), CEILING, event);
                }

                TileFeature::GentleRightFirst => gentle(obj, x0, y0, TILE_HEIGHT, TILE_HEIGHT / 2.0, event),
                TileFeature::GentleRightSecond => gentle(obj, x0, y0, TILE_HEIGHT / 2.0, 0.0, event),
                TileFeature::GentleLeftFirst => gentle(obj, x0, y0, 0.0, TILE_HEIGHT / 2.0, event),
                TileFeature::GentleLeftSecond => gentle(obj, x0, y0, TILE_HEIGHT / 2.0, TILE_HEIGHT, event),

                TileFeature::CorrectionTopLeft => {
                    let c = CORRECTION_LENGTH;
                    short(obj, Segment::new(x0 - c, y0 + c, x0, y0), FLOOR, event);
                }
                TileFeature::CorrectionTopRight => {
                    let (c, xr) = (CORRECTION_LENGTH, x0 + TILE_WIDTH);
                    short(obj, Segment::new(xr, y0, xr + c, y0 + c), FLOOR, event);
                }
                TileFeature::CorrectionBottomLeft => {
                    let (c, yb) = (CORRECTION_LENGTH, y0 + TILE_HEIGHT);
                    short(obj, Segment::new(x0 - c, yb - c, x0, yb), CEILING, event);
                }
                TileFeature::CorrectionBottomRight => {
                    let (c, xr, yb) = (CORRECTION_LENGTH, x0 + TILE_WIDTH, y0 + TILE_HEIGHT);
                    short(obj, Segment::new(xr, yb, xr + c, yb - c), CEILING, event);
                }

                TileFeature::Rooftop => {
                    let (mid, eave) = (x0 + TILE_WIDTH / 2.0, y0 + TILE_HEIGHT / 4.0);
                    short(obj, Segment::new(x0, eave, mid, y0), FLOOR, event);
                    short(obj, Segment::new(mid, y0, x0 + TILE_WIDTH, eave), FLOOR, event);
                }

                TileFeature::ShortSlopeRight => {
                    let (mid, yb) = (y0 + TILE_HEIGHT / 2.0, y0 + TILE_HEIGHT);
                    short(obj, Segment::new(x0 + TILE_WIDTH / 2.0, yb, x0 + TILE_WIDTH, mid), FLOOR, event);
                }
                TileFeature::ShortSlopeLeft => {
                    let (mid, yb) = (y0 + TILE_HEIGHT / 2.0, y0 + TILE_HEIGHT);
                    short(obj, Segment::new(x0, mid, x0 + TILE_WIDTH / 2.0, yb), FLOOR, event);
                }

                TileFeature::SpikeUp
                | TileFeature::SpikeRight
                | TileFeature::SpikeDown
                | TileFeature::SpikeLeft => spike(obj, feature, x0, y0, event),
            }
        }
    }
}

fn derive_mask(visual: &Tilemap, collision: &Tilemap, index: usize) -> FeatureMask {
    let mut mask = FeatureMask::EMPTY;

    for (layer_idx, layer) in VISUAL_LAYERS.iter().enumerate() {
        let id = visual.get_indexed_tile(layer, index);
        if id == 0 {
            continue;
        }

        let before = mask;
        for variant in COLLISION_VARIANTS {
            let value = collision.get_indexed_tile(variant, (id - 1) as usize);
            if value < COLLISION_TILE_OFFSET {
                continue;
            }
            if let Some(feature) = TileFeature::from_bit(value - COLLISION_TILE_OFFSET) {
                mask = mask.with(feature);
            }
        }

        if layer_idx == 0 && mask != before {
            mask = mask.with_bottom_layer();
        }
    }

    mask
}

/// Flat-edge margins: next to a sloped neighbor only the object's center
/// counts on that side, so the flat edge does not cut into the ramp.
fn trimmed(slope_on_left: bool, slope_on_right: bool) -> SlopeMargins {
    let m = SlopeMargins::default();
    m.with_sides(
        if slope_on_right { 0.0 } else { m.left },
        if slope_on_left { 0.0 } else { m.right },
    )
}

fn centered() -> SlopeMargins {
    SlopeMargins::default().with_sides(0.0, 0.0)
}

fn diagonal<O: CollisionObject + ?Sized>(obj: &mut O, seg: Segment, direction: f32, event: &FrameEvent) {
    let m = centered().with_safety(DIAGONAL_NEAR_MARGIN, DIAGONAL_FAR_MARGIN);
    obj.slope_collision(seg, direction, event, m, None);
}

fn short<O: CollisionObject + ?Sized>(obj: &mut O, seg: Segment, direction: f32, event: &FrameEvent) {
    obj.slope_collision(seg, direction, event, centered(), None);
}

/// One gentle-ramp tile, from height `y_left` to `y_right` (relative to the
/// tile top), resolved as two half-tile segments.
fn gentle<O: CollisionObject + ?Sized>(obj: &mut O, x0: f32, y0: f32, y_left: f32, y_right: f32, event: &FrameEvent) {
    let mid_x = x0 + TILE_WIDTH / 2.0;
    let mid_y = y0 + (y_left + y_right) / 2.0;
    short(obj, Segment::new(x0, y0 + y_left, mid_x, mid_y), FLOOR, event);
    short(obj, Segment::new(mid_x, mid_y, x0 + TILE_WIDTH, y0 + y_right), FLOOR, event);
}

/// Damage area and solid box of a spike, as top-left based rectangles.
fn spike_areas(feature: TileFeature, x0: f32, y0: f32) -> ([f32; 4], [f32; 4]) {
    let (w, h) = (TILE_WIDTH, TILE_HEIGHT);
    match feature {
        TileFeature::SpikeUp => ([x0 + 2.0, y0 + h / 2.0 - 2.0, w - 4.0, h / 2.0 + 2.0], [x0, y0 + h / 2.0, w, h / 2.0]),
        TileFeature::SpikeDown => ([x0 + 2.0, y0, w - 4.0, h / 2.0 + 2.0], [x0, y0, w, h / 2.0]),
        TileFeature::SpikeRight => ([x0, y0 + 2.0, w / 2.0 + 2.0, h - 4.0], [x0, y0, w / 2.0, h]),
        _ => ([x0 + w / 2.0 - 2.0, y0 + 2.0, w / 2.0 + 2.0, h - 4.0], [x0 + w / 2.0, y0, w / 2.0, h]),
    }
}

fn spike<O: CollisionObject + ?Sized>(obj: &mut O, feature: TileFeature, x0: f32, y0: f32, event: &FrameEvent) {
    let ([hx, hy, hw, hh], [sx, sy, sw, sh]) = spike_areas(feature, x0, y0);

    if obj.overlay_collision_area(hx, hy, hw, hh) {
        obj.hurt_collision(hx, hy, hw, hh, SPIKE_DAMAGE, event);
    }

    let m = SlopeMargins::default();
    obj.slope_collision(Segment::horizontal(sx, sx + sw, sy), FLOOR, event, m, None);
    obj.slope_collision(Segment::horizontal(sx, sx + sw, sy + sh), CEILING, event, m, None);
    obj.wall_collision(sx, sy, sh, WALL_RIGHT, event);
    obj.wall_collision(sx + sw, sy, sh, WALL_LEFT, event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collision::tests::Dummy;
    use crate::domain::math::Vector;
    use crate::domain::object::GameObject;
    use TileFeature::*;

    /// Visual IDs used by the diagrams below.
    /// '_' = 1 flat top   '/' = 2 rising slope   '\' = 3 falling slope
    /// '^' = 4 spike up   '.' = 5 decoration     '#' = 6 block (top + walls)
    fn tileset() -> Tilemap {
        let entries: [(u32, &[TileFeature]); 6] = [
            (1, &[Top]),
            (2, &[SlopeTopRight]),
            (3, &[SlopeTopLeft]),
            (4, &[SpikeUp]),
            (5, &[]),
            (6, &[Top, Left, Right, Bottom]),
        ];
        let width = 8;
        let mut set = Tilemap::new(width, 1);
        for (vi, variant) in COLLISION_VARIANTS.iter().enumerate() {
            let mut data = vec![0; width];
            for (id, feats) in entries.iter() {
                if let Some(f) = feats.get(vi) {
                    data[(*id - 1) as usize] = f.tileset_value();
                }
            }
            // Below the offset: present in the tileset but not a feature.
            data[4] = 12;
            set.add_layer(variant, data).unwrap();
        }
        set
    }

    fn visual_on(layer: &str, rows: &[&str]) -> Tilemap {
        let h = rows.len();
        let w = rows[0].len();
        let mut map = Tilemap::new(w, h).with_empty_layers(&VISUAL_LAYERS);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let id = match ch {
                    '_' => 1,
                    '/' => 2,
                    '\\' => 3,
                    '^' => 4,
                    '.' => 5,
                    '#' => 6,
                    _ => 0,
                };
                map.set_tile(layer, x, y, id);
            }
        }
        map
    }

    fn visual(rows: &[&str]) -> Tilemap {
        visual_on("middle", rows)
    }

    /// Falls/walks like a stage object: ease to `target`, integrate, collide.
    fn step(map: &CollisionMap, p: &mut Dummy, ignore_bottom: bool) {
        let ev = FrameEvent::new(1.0);
        p.update(&ev);
        p.reset_contact();
        map.object_collision(p, &ev, ignore_bottom);
    }

    fn falling_dummy(x: f32, y: f32) -> Dummy {
        let mut p = Dummy::at(x, y);
        p.core.target = Vector::new(0.0, 4.0);
        p.core.friction = Vector::new(1.0, 0.25);
        p
    }

    // ── build ──

    #[test]
    fn build_extracts_feature_bits() {
        let map = CollisionMap::new(&visual(&["_/#."]), &tileset()).unwrap();
        assert_eq!(map.mask_at(0, 0), FeatureMask::of(&[Top]));
        assert_eq!(map.mask_at(1, 0), FeatureMask::of(&[SlopeTopRight]));
        assert_eq!(map.mask_at(2, 0), FeatureMask::of(&[Top, Left, Right, Bottom]));
        assert_eq!(map.mask_at(3, 0), FeatureMask::EMPTY);
    }

    #[test]
    fn layers_are_merged() {
        let mut vis = visual(&["_"]);
        vis.set_tile("top", 0, 0, 4);
        let map = CollisionMap::new(&vis, &tileset()).unwrap();
        assert_eq!(map.mask_at(0, 0), FeatureMask::of(&[Top, SpikeUp]));
    }

    #[test]
    fn bottom_layer_features_set_marker() {
        let map = CollisionMap::new(&visual_on("bottom", &["_."]), &tileset()).unwrap();
        assert!(map.mask_at(0, 0).has_bottom_layer());
        assert!(map.mask_at(0, 0).has(Top));
        // A bottom-layer tile without features does not get the marker.
        assert!(!map.mask_at(1, 0).has_bottom_layer());
    }

    #[test]
    fn reads_outside_map_are_empty() {
        let map = CollisionMap::new(&visual(&["#"]), &tileset()).unwrap();
        assert_eq!(map.mask_at(-1, 0), FeatureMask::EMPTY);
        assert_eq!(map.mask_at(0, 1), FeatureMask::EMPTY);
    }

    #[test]
    fn floor_below_looks_down_one_column() {
        let map = CollisionMap::new(&visual(&["    ", "_   ", "  / ", "    "]), &tileset()).unwrap();
        assert!(map.has_floor_below(8.0, 2.0, 16.0));
        assert!(!map.has_floor_below(24.0, 2.0, 16.0));
        assert!(map.has_floor_below(40.0, 20.0, 16.0));
        assert!(!map.has_floor_below(40.0, 20.0, 8.0));
        assert!(!map.has_floor_below(-8.0, 20.0, 16.0));
    }

    #[test]
    fn missing_layers_are_fatal() {
        let vis = Tilemap::new(1, 1).with_empty_layers(&["bottom", "middle"]);
        assert_eq!(
            CollisionMap::new(&vis, &tileset()),
            Err(MapError::Tilemap(TilemapError::MissingLayer { name: "top".into() }))
        );
        let set = Tilemap::new(1, 1).with_empty_layers(&["1", "2", "3"]);
        assert!(matches!(
            CollisionMap::new(&visual(&["_"]), &set),
            Err(MapError::Tilemap(TilemapError::MissingLayer { .. }))
        ));
        let empty = Tilemap::new(0, 0).with_empty_layers(&COLLISION_VARIANTS);
        assert_eq!(CollisionMap::new(&visual(&["_"]), &empty), Err(MapError::EmptyTileset));
    }

    // ── recompute ──

    #[test]
    fn recompute_with_same_ids_is_identity() {
        let vis = visual(&["_/\\", "^#.", "#__"]);
        let set = tileset();
        let original = CollisionMap::new(&vis, &set).unwrap();
        let mut patched = original.clone();
        let all: Vec<usize> = (0..vis.len()).collect();
        patched.recompute_collision_tiles(&vis, &set, &all);
        assert_eq!(patched, original);
    }

    #[test]
    fn recompute_touches_only_listed_tiles() {
        let mut vis = visual(&["_/\\", "^#.", "#__"]);
        let set = tileset();
        let original = CollisionMap::new(&vis, &set).unwrap();
        let mut patched = original.clone();

        vis.set_tile("middle", 1, 1, 1);
        vis.set_tile("middle", 2, 2, 4); // changed but not listed
        patched.recompute_collision_tiles(&vis, &set, &[vis.index_of(1, 1), 999]);

        assert_eq!(patched.mask_at(1, 1), FeatureMask::of(&[Top]));
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) != (1, 1) {
                    assert_eq!(patched.mask_at(x, y), original.mask_at(x, y), "tile ({x},{y})");
                }
            }
        }
    }

    // ── query ──

    #[test]
    fn falling_object_rests_on_flat_top() {
        let map = CollisionMap::new(&visual(&[" ", "_"]), &tileset()).unwrap();
        let mut p = falling_dummy(8.0, -100.0);
        for _ in 0..200 {
            step(&map, &mut p, false);
        }
        assert_eq!(p.core.pos.y, TILE_HEIGHT / 2.0);
        assert_eq!(p.core.speed.y, 0.0);
        assert!(p.body.touch_surface);
    }

    #[test]
    fn floor_catch_is_exact_for_any_sub_tile_offset() {
        for i in 0..16 {
            let x = 16.0 + i as f32;
            let map = CollisionMap::new(&visual(&["   ", "   ", " _ "]), &tileset()).unwrap();
            let mut p = falling_dummy(x, 0.0);
            p.body.bounce_factor = Vector::new(0.0, 0.5);
            let mut landed = false;
            for _ in 0..60 {
                let before = p.core.speed.y;
                step(&map, &mut p, false);
                if !p.slope_events.is_empty() && !landed {
                    landed = true;
                    assert_eq!(p.core.pos.y, 2.0 * TILE_HEIGHT - 8.0);
                    let incoming = (before + 0.25).min(4.0);
                    assert_eq!(p.core.speed.y, -0.5 * incoming);
                }
            }
            assert!(landed, "no landing at x = {x}");
        }
    }

    #[test]
    fn window_clamps_and_resamples_edge_tiles() {
        let map = CollisionMap::new(&visual(&["_"]), &tileset()).unwrap();
        let mut p = Dummy::at(0.0, 0.0)
            .moved(Vector::new(8.0, -10.0), Vector::new(8.0, -7.0), Vector::new(0.0, 3.0));
        map.object_collision(&mut p, &FrameEvent::new(1.0), false);
        // Every one of the 25 clamped window cells is the same tile.
        assert_eq!(p.slope_events.len(), 25);
        assert_eq!(p.core.pos.y, -8.0);
    }

    #[test]
    fn ignore_bottom_layer_skips_marked_tiles() {
        let map = CollisionMap::new(&visual_on("bottom", &[" ", "_"]), &tileset()).unwrap();
        let mut p = falling_dummy(8.0, 0.0);
        for _ in 0..20 {
            step(&map, &mut p, true);
        }
        assert!(p.slope_events.is_empty());
        assert!(p.core.pos.y > 16.0);
    }

    #[test]
    fn inactive_object_is_skipped() {
        let map = CollisionMap::new(&visual(&["_"]), &tileset()).unwrap();
        let mut p = Dummy::at(0.0, 0.0)
            .moved(Vector::new(8.0, -10.0), Vector::new(8.0, -7.0), Vector::new(0.0, 3.0));
        p.core.in_camera = false;
        map.object_collision(&mut p, &FrameEvent::new(1.0), false);
        assert!(p.slope_events.is_empty());
    }

    #[test]
    fn walls_block_horizontal_motion() {
        let map = CollisionMap::new(&visual(&["     ", "   # ", "_____"]), &tileset()).unwrap();
        let mut p = Dummy::at(0.0, 0.0)
            .moved(Vector::new(36.0, 24.0), Vector::new(41.0, 24.0), Vector::new(5.0, 0.0));
        map.object_collision(&mut p, &FrameEvent::new(1.0), false);
        assert_eq!(p.core.pos.x, 40.0);
        assert!(p.wall_events.contains(&WALL_RIGHT));
    }

    #[test]
    fn spikes_hurt_and_hold() {
        let map = CollisionMap::new(&visual(&["     ", "     ", "  ^  ", "     ", "     "]), &tileset()).unwrap();
        let mut p = falling_dummy(40.0, 20.0);
        for _ in 0..30 {
            step(&map, &mut p, false);
        }
        assert!(p.hurt_damage >= SPIKE_DAMAGE);
        // Standing on the spike's solid lower half.
        assert_eq!(p.core.pos.y, 2.0 * TILE_HEIGHT + TILE_HEIGHT / 2.0 - 8.0);
    }

    #[test]
    fn object_walks_up_diagonal_on_the_line() {
        let map = CollisionMap::new(&visual(&["   ", "   ", " /_", "   "]), &tileset()).unwrap();
        let mut p = Dummy::at(18.0, 38.0);
        p.core.speed = Vector::new(1.0, 0.0);
        p.core.target = Vector::new(1.0, 4.0);
        p.core.friction = Vector::new(1.0, 0.25);

        let mut last_y = p.core.pos.y;
        for _ in 0..24 {
            step(&map, &mut p, false);
            let x = p.core.pos.x;
            if x < 32.0 {
                let line = 48.0 - (x - 16.0);
                assert!((p.core.pos.y + 8.0 - line).abs() < 1e-3, "off the slope at x = {x}");
                assert!(p.body.touch_surface);
            } else {
                assert_eq!(p.core.pos.y, 24.0, "not on the flat top at x = {x}");
            }
            assert!((p.core.pos.y - last_y).abs() <= 1.0 + 1e-3, "jump at x = {x}");
            last_y = p.core.pos.y;
        }
        assert!(p.core.pos.x >= 40.0);
    }

    #[test]
    fn object_walks_down_diagonal_on_the_line() {
        let map = CollisionMap::new(&visual(&["   ", "   ", "#\\ ", "   "]), &tileset()).unwrap();
        let mut p = Dummy::at(10.0, 24.0);
        p.core.speed = Vector::new(1.0, 0.0);
        p.core.target = Vector::new(1.0, 4.0);
        p.core.friction = Vector::new(1.0, 0.25);

        let mut last_y = p.core.pos.y;
        for _ in 0..20 {
            step(&map, &mut p, false);
            let x = p.core.pos.x;
            if x > 16.0 {
                let line = 32.0 + (x - 16.0);
                assert!((p.core.pos.y + 8.0 - line).abs() < 1e-3, "left the slope at x = {x}");
            }
            assert!(p.body.touch_surface, "airborne at x = {x}");
            assert!((p.core.pos.y - last_y).abs() <= 1.0 + 1e-3, "jump at x = {x}");
            last_y = p.core.pos.y;
        }
        assert_eq!(p.core.pos.x, 30.0);
    }

    #[test]
    fn fast_fall_does_not_tunnel_through_diagonal() {
        let map = CollisionMap::new(&visual(&["   ", "   ", " / ", "   "]), &tileset()).unwrap();
        let mut p = falling_dummy(24.0, 0.0);
        p.core.speed.y = 4.0;
        for _ in 0..40 {
            step(&map, &mut p, false);
        }
        // Line under x = 24 is at y = 40.
        assert!((p.core.pos.y - 32.0).abs() < 1e-3);
    }

    #[test]
    fn flat_top_next_to_ramp_only_counts_center() {
        let map = CollisionMap::new(&visual(&["   ", " /_"]), &tileset()).unwrap();
        // Center over the ramp, box overlapping the flat tile.
        let mut p = Dummy::at(0.0, 0.0)
            .moved(Vector::new(26.0, 8.0), Vector::new(26.0, 10.0), Vector::new(0.0, 2.0));
        map.object_collision(&mut p, &FrameEvent::new(1.0), false);
        assert!(p.slope_events.is_empty());
    }
}
