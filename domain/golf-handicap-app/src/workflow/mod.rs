pub mod handicap;
pub mod leaderboard;
pub mod round;
