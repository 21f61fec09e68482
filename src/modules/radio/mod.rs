pub mod controller;
pub mod model;
pub mod router;
pub mod schedule;
pub mod service;
pub mod store;

pub use router::init_radio_router;
