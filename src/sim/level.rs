/// Level loader: text levels → visual tilemap, spawn list and the built-in
/// collision tileset.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1: `; Level Name` (optional; lines starting with `;` are comments)
///   Lines: map rows, all the same width
///
/// ## Tile legend:
///   '#' = Ground (faces exposed to air collide)   ' ' = Empty
///   '/' = Slope up-right      '\' = Slope down-right
///   '7' = Ceiling slope, solid top-right   'F' = Ceiling slope, solid top-left
///   'r' 'R' = Gentle ramp up (first, second half)
///   'l' 'L' = Gentle ramp down (first, second half)
///   'A' = Rooftop             'n' 'm' = Short slope up / down
///   '(' ')' = Ledge corner with correction ramp (left, right)
///   '[' ']' = Ceiling corner with correction ramp (left, right)
///   '^' '>' 'v' '<' = Spikes, by pointing direction
///   'B' 'b' = Blue block, solid / ghost     'O' 'o' = Orange block, solid / ghost
///   '-' = Background ledge (bottom layer)   '"' = Foliage (top layer)
///   '~' = Water               '%' = Lava
///
/// ## Markers (not tiles):
///   'P' = Player spawn        '1'..'9' = Enemy, by registry id
///   '=' = Horizontal platform 'I' = Vertical platform

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::math::Vector;
use crate::domain::tile::{TileFeature, TILE_HEIGHT, TILE_WIDTH};
use crate::domain::tilemap::{Tilemap, COLLISION_VARIANTS, VISUAL_LAYERS};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} is {actual} tiles wide, expected {expected}")]
    Ragged { row: usize, expected: usize, actual: usize },
    #[error("unknown tile '{ch}' at ({x}, {y})")]
    UnknownTile { ch: char, x: usize, y: usize },
    #[error("could not read level: {0}")]
    Io(#[from] std::io::Error),
}

// ══════════════════════════════════════════════════════════════
// Visual tile IDs
// ══════════════════════════════════════════════════════════════

/// Ground tiles are `GROUND_BASE + exposed faces` (top 1, right 2,
/// bottom 4, left 8), so every face combination has its own ID.
pub const GROUND_BASE: u32 = 1;
const FACE_TOP: u32 = 1;
const FACE_RIGHT: u32 = 2;
const FACE_BOTTOM: u32 = 4;
const FACE_LEFT: u32 = 8;

pub const SLOPE_UP: u32 = 17;
pub const SLOPE_DOWN: u32 = 18;
pub const CEILING_RIGHT: u32 = 19;
pub const CEILING_LEFT: u32 = 20;
pub const GENTLE_UP_FIRST: u32 = 21;
pub const GENTLE_UP_SECOND: u32 = 22;
pub const GENTLE_DOWN_FIRST: u32 = 23;
pub const GENTLE_DOWN_SECOND: u32 = 24;
pub const ROOFTOP: u32 = 25;
pub const SHORT_UP: u32 = 26;
pub const SHORT_DOWN: u32 = 27;
pub const SPIKE_UP: u32 = 28;
pub const SPIKE_RIGHT: u32 = 29;
pub const SPIKE_DOWN: u32 = 30;
pub const SPIKE_LEFT: u32 = 31;
pub const BLUE_SOLID: u32 = 32;
pub const BLUE_GHOST: u32 = 33;
pub const ORANGE_SOLID: u32 = 34;
pub const ORANGE_GHOST: u32 = 35;
pub const LEDGE: u32 = 36;
pub const WATER: u32 = 37;
pub const LAVA: u32 = 38;
pub const FOLIAGE: u32 = 39;
pub const LEDGE_LEFT: u32 = 40;
pub const LEDGE_RIGHT: u32 = 41;
pub const CORNER_LEFT: u32 = 42;
pub const CORNER_RIGHT: u32 = 43;

const TILE_COUNT: u32 = 43;

/// Features of every non-ground tile. At most one per collision variant.
const TILE_FEATURES: &[(u32, &[TileFeature])] = {
    use TileFeature::*;
    &[
        (SLOPE_UP, &[SlopeTopRight]),
        (SLOPE_DOWN, &[SlopeTopLeft]),
        (CEILING_RIGHT, &[SlopeBottomRight]),
        (CEILING_LEFT, &[SlopeBottomLeft]),
        (GENTLE_UP_FIRST, &[GentleRightFirst]),
        (GENTLE_UP_SECOND, &[GentleRightSecond]),
        (GENTLE_DOWN_FIRST, &[GentleLeftFirst]),
        (GENTLE_DOWN_SECOND, &[GentleLeftSecond]),
        (ROOFTOP, &[Rooftop]),
        (SHORT_UP, &[ShortSlopeRight]),
        (SHORT_DOWN, &[ShortSlopeLeft]),
        (SPIKE_UP, &[SpikeUp]),
        (SPIKE_RIGHT, &[SpikeRight]),
        (SPIKE_DOWN, &[SpikeDown]),
        (SPIKE_LEFT, &[SpikeLeft]),
        (BLUE_SOLID, &[Top, Right, Bottom, Left]),
        (ORANGE_SOLID, &[Top, Right, Bottom, Left]),
        (LEDGE, &[Top]),
        (LEDGE_LEFT, &[Top, Left, CorrectionTopLeft]),
        (LEDGE_RIGHT, &[Top, Right, CorrectionTopRight]),
        (CORNER_LEFT, &[Bottom, Left, CorrectionBottomLeft]),
        (CORNER_RIGHT, &[Bottom, Right, CorrectionBottomRight]),
    ]
};

/// The other state of a color block, if `id` is one.
pub fn color_block_partner(id: u32) -> Option<u32> {
    match id {
        BLUE_SOLID => Some(BLUE_GHOST),
        BLUE_GHOST => Some(BLUE_SOLID),
        ORANGE_SOLID => Some(ORANGE_GHOST),
        ORANGE_GHOST => Some(ORANGE_SOLID),
        _ => None,
    }
}

/// Character used to draw a visual tile ID.
pub fn tile_char(id: u32) -> char {
    match id {
        0 => ' ',
        GROUND_BASE..=16 => '#',
        SLOPE_UP => '/',
        SLOPE_DOWN => '\\',
        CEILING_RIGHT => '7',
        CEILING_LEFT => 'F',
        GENTLE_UP_FIRST => 'r',
        GENTLE_UP_SECOND => 'R',
        GENTLE_DOWN_FIRST => 'l',
        GENTLE_DOWN_SECOND => 'L',
        ROOFTOP => 'A',
        SHORT_UP => 'n',
        SHORT_DOWN => 'm',
        SPIKE_UP => '^',
        SPIKE_RIGHT => '>',
        SPIKE_DOWN => 'v',
        SPIKE_LEFT => '<',
        BLUE_SOLID => 'B',
        BLUE_GHOST => 'b',
        ORANGE_SOLID => 'O',
        ORANGE_GHOST => 'o',
        LEDGE => '-',
        WATER => '~',
        LAVA => '%',
        FOLIAGE => '"',
        LEDGE_LEFT => '(',
        LEDGE_RIGHT => ')',
        CORNER_LEFT => '[',
        CORNER_RIGHT => ']',
        _ => '?',
    }
}

/// The built-in collision tileset: variants "1".."4", one column per
/// visual tile ID (column `id - 1`), values `257 + feature bit`.
pub fn builtin_tileset() -> Tilemap {
    let width = TILE_COUNT as usize;
    let mut columns: Vec<Vec<TileFeature>> = vec![Vec::new(); width];

    for faces in 0..16 {
        let col = &mut columns[(GROUND_BASE + faces - 1) as usize];
        if faces & FACE_TOP != 0 { col.push(TileFeature::Top); }
        if faces & FACE_RIGHT != 0 { col.push(TileFeature::Right); }
        if faces & FACE_BOTTOM != 0 { col.push(TileFeature::Bottom); }
        if faces & FACE_LEFT != 0 { col.push(TileFeature::Left); }
    }
    for (id, features) in TILE_FEATURES {
        columns[(*id - 1) as usize] = features.to_vec();
    }

    debug_assert!(
        columns.iter().all(|features| features.len() <= COLLISION_VARIANTS.len()),
        "a tile declares more features than there are tileset variants"
    );

    let mut tileset = Tilemap::new(width, 1);
    for (variant_idx, variant) in COLLISION_VARIANTS.iter().enumerate() {
        let data = columns
            .iter()
            .map(|features| features.get(variant_idx).map_or(0, |f| f.tileset_value()))
            .collect();
        let added = tileset.add_layer(variant, data);
        debug_assert!(added.is_ok(), "tileset variant {variant}: {added:?}");
    }
    tileset
}

// ══════════════════════════════════════════════════════════════
// Level definitions
// ══════════════════════════════════════════════════════════════

/// Raw level text, one string per row.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnKind {
    Player,
    /// Enemy registry id. Unknown ids are reported by the stage.
    Enemy(u8),
    Platform { vertical: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spawn {
    pub kind: SpawnKind,
    /// Center of the marker's tile.
    pub pos: Vector,
}

/// A parsed level, ready for a stage.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub visual: Tilemap,
    pub spawns: Vec<Spawn>,
}

impl Level {
    pub fn world_size(&self) -> (f32, f32) {
        (self.visual.width as f32 * TILE_WIDTH, self.visual.height as f32 * TILE_HEIGHT)
    }
}

impl LevelDef {
    /// Parse a level from file text.
    pub fn parse(content: &str) -> Result<LevelDef, LevelError> {
        let mut name = String::new();
        let mut rows = vec![];

        for line in content.lines() {
            if let Some(comment) = line.strip_prefix(';') {
                if name.is_empty() {
                    name = comment.trim().to_string();
                }
            } else {
                rows.push(line.trim_end_matches('\r').to_string());
            }
        }

        while rows.last().map_or(false, |r| r.trim().is_empty()) {
            rows.pop();
        }
        if rows.is_empty() {
            return Err(LevelError::Empty);
        }
        if name.is_empty() {
            name = "Unnamed Level".to_string();
        }

        Ok(LevelDef { name, rows })
    }

    /// Build the visual tilemap and spawn list.
    pub fn build(&self) -> Result<Level, LevelError> {
        let height = self.rows.len();
        let width = self.rows.first().map_or(0, |r| r.chars().count());
        if height == 0 || width == 0 {
            return Err(LevelError::Empty);
        }

        let grid: Vec<Vec<char>> = self.rows.iter().map(|r| r.chars().collect()).collect();
        for (row, cells) in grid.iter().enumerate() {
            if cells.len() != width {
                return Err(LevelError::Ragged { row, expected: width, actual: cells.len() });
            }
        }

        let mut visual = Tilemap::new(width, height).with_empty_layers(&VISUAL_LAYERS);
        let mut spawns = vec![];

        for (y, cells) in grid.iter().enumerate() {
            for (x, &ch) in cells.iter().enumerate() {
                let center = Vector::new(
                    (x as f32 + 0.5) * TILE_WIDTH,
                    (y as f32 + 0.5) * TILE_HEIGHT,
                );
                let marker = match ch {
                    'P' => Some(SpawnKind::Player),
                    '1'..='9' => ch.to_digit(10).map(|d| SpawnKind::Enemy(d as u8)),
                    '=' => Some(SpawnKind::Platform { vertical: false }),
                    'I' => Some(SpawnKind::Platform { vertical: true }),
                    _ => None,
                };
                if let Some(kind) = marker {
                    spawns.push(Spawn { kind, pos: center });
                    continue;
                }

                let (layer, id) = match ch {
                    ' ' => continue,
                    '#' => ("middle", GROUND_BASE + exposed_faces(&grid, x, y)),
                    '-' => ("bottom", LEDGE),
                    '"' => ("top", FOLIAGE),
                    _ => match tile_id(ch) {
                        Some(id) => ("middle", id),
                        None => return Err(LevelError::UnknownTile { ch, x, y }),
                    },
                };
                visual.set_tile(layer, x, y, id);
            }
        }

        log::debug!("level \"{}\": {}x{} tiles, {} spawns", self.name, width, height, spawns.len());
        Ok(Level { name: self.name.clone(), visual, spawns })
    }
}

fn tile_id(ch: char) -> Option<u32> {
    let id = match ch {
        '/' => SLOPE_UP,
        '\\' => SLOPE_DOWN,
        '7' => CEILING_RIGHT,
        'F' => CEILING_LEFT,
        'r' => GENTLE_UP_FIRST,
        'R' => GENTLE_UP_SECOND,
        'l' => GENTLE_DOWN_FIRST,
        'L' => GENTLE_DOWN_SECOND,
        'A' => ROOFTOP,
        'n' => SHORT_UP,
        'm' => SHORT_DOWN,
        '^' => SPIKE_UP,
        '>' => SPIKE_RIGHT,
        'v' => SPIKE_DOWN,
        '<' => SPIKE_LEFT,
        'B' => BLUE_SOLID,
        'b' => BLUE_GHOST,
        'O' => ORANGE_SOLID,
        'o' => ORANGE_GHOST,
        '~' => WATER,
        '%' => LAVA,
        '(' => LEDGE_LEFT,
        ')' => LEDGE_RIGHT,
        '[' => CORNER_LEFT,
        ']' => CORNER_RIGHT,
        _ => return None,
    };
    Some(id)
}

#[derive(Clone, Copy)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Faces of a ground tile that touch air. Outside the map counts as solid.
fn exposed_faces(grid: &[Vec<char>], x: usize, y: usize) -> u32 {
    let neighbor = |dx: i32, dy: i32| -> Option<char> {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx < 0 || ny < 0 {
            return None;
        }
        grid.get(ny as usize).and_then(|r| r.get(nx as usize)).copied()
    };

    // A neighbor hides our face if its side facing us is fully solid.
    let hidden = |n: Option<char>, facing: Side| n.map_or(true, |ch| covers(ch, facing));

    let mut faces = 0;
    if !hidden(neighbor(0, -1), Side::Bottom) { faces |= FACE_TOP; }
    if !hidden(neighbor(1, 0), Side::Left) { faces |= FACE_RIGHT; }
    if !hidden(neighbor(0, 1), Side::Top) { faces |= FACE_BOTTOM; }
    if !hidden(neighbor(-1, 0), Side::Right) { faces |= FACE_LEFT; }
    faces
}

/// Is side `side` of a tile drawn with `ch` fully solid?
fn covers(ch: char, side: Side) -> bool {
    match ch {
        '#' | '(' | ')' | '[' | ']' => true,
        '/' => matches!(side, Side::Bottom | Side::Right),
        '\\' => matches!(side, Side::Bottom | Side::Left),
        '7' => matches!(side, Side::Top | Side::Right),
        'F' => matches!(side, Side::Top | Side::Left),
        'R' => matches!(side, Side::Bottom | Side::Right),
        'l' => matches!(side, Side::Bottom | Side::Left),
        'r' | 'L' | 'A' | 'n' | 'm' => matches!(side, Side::Bottom),
        _ => false,
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Read one level file.
pub fn read_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path)?;
    LevelDef::parse(&content)
}

/// Levels from `dir` (sorted by file name), or the embedded ones if the
/// directory is missing or holds no valid level.
pub fn load_levels(dir: &Path) -> Vec<LevelDef> {
    let levels = load_from_directory(dir);
    if levels.is_empty() {
        log::info!("no levels in {}, using built-in levels", dir.display());
        return embedded_levels();
    }
    log::info!("loaded {} levels from {}", levels.len(), dir.display());
    levels
}

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    paths.sort();

    let mut results = vec![];
    for path in paths {
        match read_level_file(&path).and_then(|def| def.build().map(|_| def)) {
            Ok(def) => results.push(def),
            Err(e) => log::warn!("skipping {}: {e}", path.display()),
        }
    }
    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Stage 1 - Rolling Hills", &[
            "                                                ",
            "                                                ",
            "                                                ",
            "                                                ",
            "               1 A      3                       ",
            "              ####        7#####F     B     =   ",
            "                                      B2        ",
            "    --- I         1           ^^  rR#####\\      ",
            "            /#######)oooo  (################%%##",
            "   P  \"\"  /##########~~~~~~#####################",
            "#####################~~~~~~#####################",
            "################################################",
            "################################################",
        ]),
        make_embedded("Stage 2 - Spike Hall", &[
            "################################",
            "#                              #",
            "#                              #",
            "#      [#######]               #",
            "#         vv                   #",
            "#                              #",
            "#   =             3    ##      #",
            "#                      ##   bb #",
            "#           1         <##> O   #",
            "# P  rR###lL  nm   ^^  ##  O 2 #",
            "################################",
            "################################",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}
