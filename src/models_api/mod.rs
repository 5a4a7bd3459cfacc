pub mod team;
pub mod stadium;
pub mod player;
pub mod player_stats;
pub mod coach;
pub mod game;
