pub mod clock;
pub mod config;
pub mod errors;
pub mod kernel;
pub mod outcome;
pub mod traits;
pub mod types;
