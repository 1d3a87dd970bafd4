//! Terrain layer classification.
//!
//! The discriminants are written straight into the heightmap artifact and
//! decoded by the tiler, so they must never be renumbered.

/// One of the four fixed terrain bands.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TerrainLayer {
    Water = 0,
    #[default]
    Land = 1,
    PineMountain = 2,
    RockMountain = 3,
}

/// Highest normalized byte that is still water.
pub const WATER_MAX: u8 = 79;
/// Highest normalized byte that is still land.
pub const LAND_MAX: u8 = 159;
/// Highest normalized byte that is still pine mountain.
pub const PINE_MOUNTAIN_MAX: u8 = 219;

impl TerrainLayer {
    pub const ALL: [TerrainLayer; 4] = [
        TerrainLayer::Water,
        TerrainLayer::Land,
        TerrainLayer::PineMountain,
        TerrainLayer::RockMountain,
    ];

    /// Classify a normalized height byte.
    pub fn classify(height: u8) -> Self {
        match height {
            0..=WATER_MAX => TerrainLayer::Water,
            80..=LAND_MAX => TerrainLayer::Land,
            160..=PINE_MOUNTAIN_MAX => TerrainLayer::PineMountain,
            _ => TerrainLayer::RockMountain,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            TerrainLayer::Water => "water",
            TerrainLayer::Land => "land",
            TerrainLayer::PineMountain => "pine_mountain",
            TerrainLayer::RockMountain => "rock_mountain",
        }
    }
}

/// Error returned when a byte is not a known layer discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownTerrainLayer(pub u8);

impl TryFrom<u8> for TerrainLayer {
    type Error = UnknownTerrainLayer;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TerrainLayer::Water),
            1 => Ok(TerrainLayer::Land),
            2 => Ok(TerrainLayer::PineMountain),
            3 => Ok(TerrainLayer::RockMountain),
            other => Err(UnknownTerrainLayer(other)),
        }
    }
}

impl std::fmt::Display for TerrainLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
