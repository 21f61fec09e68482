pub mod client;
pub mod controller;
pub mod model;
pub mod normalize;
pub mod router;
pub mod service;

pub use router::init_tally_router;
