pub mod calibration;
pub mod collector;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod export;
pub mod game_log;
pub mod model;
pub mod props;
pub mod sampler;

pub use config::EngineConfig;
pub use engine::{BatchEntry, Engine, HistoryProvider};
pub use error::EngineError;
pub use model::{
    Direction, EstimationResult, PropLine, PropRequest, SampleSet, SimulatedDistribution,
    StatCategory, StatObservation,
};
