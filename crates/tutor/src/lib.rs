pub mod agents;
pub mod errors;
pub mod manager;
pub mod math;
pub mod models;
pub mod policy;
pub mod providers;
pub mod router;
pub mod search;
