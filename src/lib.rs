pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod declaration;
pub mod errors;
pub mod lease;
pub mod model;
pub mod state;
pub mod store;
pub mod sync;
