/// Events emitted during a stage step.
/// The presentation layer consumes these for the status line and the log.

use crate::sim::entities::EnemyKind;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PlayerHurt { health: i32 },
    PlayerKilled,
    PlayerRespawned,
    PlayerSplash,
    ShotFired,
    EnemyKilled { kind: EnemyKind },
    EnemyStomped { kind: EnemyKind },
    ColorBlocksToggled { changed: usize },
    StageCleared,
    GameOver,
}
