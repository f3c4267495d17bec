/// Tile collision features and the per-tile feature bitmask.
///
/// Each tile of a collision map carries a 32-bit mask. Bits 0..=22 are the
/// geometric features below; bit 23 marks a tile whose features (some of
/// them) come from the bottom visual layer. Feature semantics live here so
/// the rest of the code only asks the mask questions.

pub const TILE_WIDTH: f32 = 16.0;
pub const TILE_HEIGHT: f32 = 16.0;

/// Collision tileset values at or above this encode `value - OFFSET` as a
/// feature bit index. Lower values mean "no feature".
pub const COLLISION_TILE_OFFSET: u32 = 257;

/// Damage dealt by touching any spike.
pub const SPIKE_DAMAGE: i32 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum TileFeature {
    // Flat edges
    Top = 0,
    Right = 1,
    Bottom = 2,
    Left = 3,
    // Full diagonals, named after the corner the solid part fills up to.
    /// Floor rising from bottom-left to top-right.
    SlopeTopRight = 4,
    /// Floor falling from top-left to bottom-right.
    SlopeTopLeft = 5,
    /// Ceiling from top-left down to bottom-right.
    SlopeBottomRight = 6,
    /// Ceiling from bottom-left up to top-right.
    SlopeBottomLeft = 7,
    // Gentle two-tile ramps, one bit per half.
    GentleRightFirst = 8,
    GentleRightSecond = 9,
    GentleLeftFirst = 10,
    GentleLeftSecond = 11,
    // Short corner ramps reaching 4 units outside the tile.
    CorrectionTopLeft = 12,
    CorrectionTopRight = 13,
    CorrectionBottomLeft = 14,
    CorrectionBottomRight = 15,
    Rooftop = 16,
    // Half-tile diagonals in the lower half.
    ShortSlopeRight = 17,
    ShortSlopeLeft = 18,
    // Spikes, named after the direction they point.
    SpikeUp = 19,
    SpikeRight = 20,
    SpikeDown = 21,
    SpikeLeft = 22,
}

impl TileFeature {
    pub const ALL: [TileFeature; 23] = [
        TileFeature::Top,
        TileFeature::Right,
        TileFeature::Bottom,
        TileFeature::Left,
        TileFeature::SlopeTopRight,
        TileFeature::SlopeTopLeft,
        TileFeature::SlopeBottomRight,
        TileFeature::SlopeBottomLeft,
        TileFeature::GentleRightFirst,
        TileFeature::GentleRightSecond,
        TileFeature::GentleLeftFirst,
        TileFeature::GentleLeftSecond,
        TileFeature::CorrectionTopLeft,
        TileFeature::CorrectionTopRight,
        TileFeature::CorrectionBottomLeft,
        TileFeature::CorrectionBottomRight,
        TileFeature::Rooftop,
        TileFeature::ShortSlopeRight,
        TileFeature::ShortSlopeLeft,
        TileFeature::SpikeUp,
        TileFeature::SpikeRight,
        TileFeature::SpikeDown,
        TileFeature::SpikeLeft,
    ];

    pub fn from_bit(bit: u32) -> Option<TileFeature> {
        TileFeature::ALL.get(bit as usize).copied()
    }

    pub fn bit(self) -> u32 {
        self as u32
    }

    /// Tileset value that encodes this feature.
    pub fn tileset_value(self) -> u32 {
        COLLISION_TILE_OFFSET + self.bit()
    }
}

/// Per-tile feature bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub struct FeatureMask(pub u32);

impl FeatureMask {
    pub const EMPTY: FeatureMask = FeatureMask(0);
    pub const BOTTOM_LAYER_BIT: u32 = 23;

    pub fn of(features: &[TileFeature]) -> Self {
        features.iter().fold(FeatureMask::EMPTY, |m, &f| m.with(f))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn has(self, feature: TileFeature) -> bool {
        self.0 & (1 << feature.bit()) != 0
    }

    pub fn with(self, feature: TileFeature) -> Self {
        FeatureMask(self.0 | (1 << feature.bit()))
    }

    pub fn has_bottom_layer(self) -> bool {
        self.0 & (1 << Self::BOTTOM_LAYER_BIT) != 0
    }

    pub fn with_bottom_layer(self) -> Self {
        FeatureMask(self.0 | (1 << Self::BOTTOM_LAYER_BIT))
    }

    /// Any floor that is not flat. Used to trim neighboring flat floors.
    pub fn has_floor_slope(self) -> bool {
        [
            TileFeature::SlopeTopRight,
            TileFeature::SlopeTopLeft,
            TileFeature::GentleRightFirst,
            TileFeature::GentleRightSecond,
            TileFeature::GentleLeftFirst,
            TileFeature::GentleLeftSecond,
        ]
        .iter()
        .any(|&f| self.has(f))
    }

    /// Any ceiling that is not flat.
    pub fn has_ceiling_slope(self) -> bool {
        self.has(TileFeature::SlopeBottomRight) || self.has(TileFeature::SlopeBottomLeft)
    }

    pub fn features(self) -> impl Iterator<Item = TileFeature> {
        TileFeature::ALL.into_iter().filter(move |&f| self.has(f))
    }
}
