pub mod engine;
pub mod sdk;
pub mod stability;
pub mod sweep;
pub mod tuner;
