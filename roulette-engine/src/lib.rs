pub mod predict;
pub mod sampler;
pub mod stats;
pub mod wheel;

pub use predict::{predict_next_numbers, EngineConfig, PredictionWeights, Predictor, ScoreBreakdown};
pub use stats::{
    cold_numbers, color_stats, compute_round_stats, hot_numbers, number_frequencies, parity_stats,
    ColorStats, FrequencyMap, ParityStats, RoundStats,
};
pub use wheel::{color_of, parity_of, Color, Parity};
