// Library for tests to access modules

pub mod bridge;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod rates;
pub mod sampler;
pub mod scheduler;
pub mod sources;
pub mod telemetry_log;
pub mod window;
