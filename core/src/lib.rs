//! Suspected unauthorised commercial electricity use: periodic detection
//! over metered-account histories and citizen complaints.

pub mod account;
pub mod complaints;
pub mod config;
pub mod error;
pub mod features;
pub mod network;
pub mod pipeline;
pub mod publisher;
pub mod rng;
pub mod scaler;
pub mod scheduler;
pub mod scorer;
pub mod store;
pub mod training;
pub mod types;
pub mod violator;
