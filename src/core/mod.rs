pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod signature;
