pub mod env;
pub mod normalize;
pub mod telemetry;
