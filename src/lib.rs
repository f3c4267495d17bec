/// Slope-and-wall tile collision core for a 2D action platformer.
///
/// `domain` holds the engine-independent core (objects, collision, tile
/// maps, pools), `sim` the playable layer built on it (levels, entities,
/// stage pipeline) and `ui` the crossterm front end.

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;
