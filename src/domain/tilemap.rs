/// Tilemap: a grid of tile IDs split into named layers.
///
/// Used twice: as the *visual* map of a stage (layers `bottom`, `middle`,
/// `top`) and as the *collision tileset* (layers `1`..`4`, read through
/// `get_indexed_tile`). Tile ID 0 means "no tile". Reads outside the grid or
/// from an unknown layer return 0.

use std::collections::HashMap;

use thiserror::Error;

pub const VISUAL_LAYERS: [&str; 3] = ["bottom", "middle", "top"];
pub const COLLISION_VARIANTS: [&str; 4] = ["1", "2", "3", "4"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TilemapError {
    #[error("tilemap has no layer named \"{name}\"")]
    MissingLayer { name: String },
    #[error("layer \"{name}\" holds {actual} tiles, expected {expected}")]
    SizeMismatch { name: String, expected: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap {
    pub width: usize,
    pub height: usize,
    layers: HashMap<String, Vec<u32>>,
}

impl Tilemap {
    pub fn new(width: usize, height: usize) -> Self {
        Tilemap { width, height, layers: HashMap::new() }
    }

    /// Add (or replace) a layer. `data` is row-major, `width * height` long.
    pub fn add_layer(&mut self, name: &str, data: Vec<u32>) -> Result<(), TilemapError> {
        let expected = self.width * self.height;
        if data.len() != expected {
            return Err(TilemapError::SizeMismatch {
                name: name.to_string(),
                expected,
                actual: data.len(),
            });
        }
        self.layers.insert(name.to_string(), data);
        Ok(())
    }

    /// Builder form of `add_layer` filled with zeros.
    pub fn with_empty_layers(mut self, names: &[&str]) -> Self {
        for name in names {
            self.layers.insert(name.to_string(), vec![0; self.width * self.height]);
        }
        self
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Fail unless every named layer exists.
    pub fn require_layers(&self, names: &[&str]) -> Result<(), TilemapError> {
        match names.iter().find(|n| !self.has_layer(n)) {
            Some(missing) => Err(TilemapError::MissingLayer { name: missing.to_string() }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get_tile(&self, layer: &str, x: i32, y: i32) -> u32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0;
        }
        self.get_indexed_tile(layer, y as usize * self.width + x as usize)
    }

    pub fn get_indexed_tile(&self, layer: &str, index: usize) -> u32 {
        self.layers
            .get(layer)
            .and_then(|data| data.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Overwrite one tile. Returns the previous ID, or `None` if the
    /// position or layer does not exist.
    pub fn set_tile(&mut self, layer: &str, x: usize, y: usize, id: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y * self.width + x;
        let slot = self.layers.get_mut(layer)?.get_mut(index)?;
        Some(std::mem::replace(slot, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_size_is_checked() {
        let mut map = Tilemap::new(2, 2);
        assert!(map.add_layer("bottom", vec![1, 2, 3, 4]).is_ok());
        assert_eq!(
            map.add_layer("top", vec![1]),
            Err(TilemapError::SizeMismatch { name: "top".into(), expected: 4, actual: 1 })
        );
    }

    #[test]
    fn reads_outside_grid_or_layer_are_zero() {
        let mut map = Tilemap::new(2, 1);
        map.add_layer("bottom", vec![7, 8]).unwrap();
        assert_eq!(map.get_tile("bottom", 1, 0), 8);
        assert_eq!(map.get_tile("bottom", 2, 0), 0);
        assert_eq!(map.get_tile("bottom", -1, 0), 0);
        assert_eq!(map.get_tile("middle", 0, 0), 0);
        assert_eq!(map.get_indexed_tile("bottom", 99), 0);
    }

    #[test]
    fn require_layers_names_the_missing_one() {
        let map = Tilemap::new(1, 1).with_empty_layers(&["bottom", "top"]);
        assert_eq!(
            map.require_layers(&VISUAL_LAYERS),
            Err(TilemapError::MissingLayer { name: "middle".into() })
        );
    }

    #[test]
    fn set_tile_returns_previous() {
        let mut map = Tilemap::new(2, 2).with_empty_layers(&["middle"]);
        assert_eq!(map.set_tile("middle", 1, 1, 5), Some(0));
        assert_eq!(map.set_tile("middle", 1, 1, 6), Some(5));
        assert_eq!(map.set_tile("middle", 2, 1, 6), None);
        assert_eq!(map.set_tile("nope", 0, 0, 6), None);
        assert_eq!(map.get_tile("middle", 1, 1), 6);
    }
}
