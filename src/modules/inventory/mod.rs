pub mod controller;
pub mod model;
pub mod router;
pub mod service;
pub mod stock;

pub use router::init_inventory_router;
