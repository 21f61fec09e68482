pub mod controller;
pub mod model;
pub mod router;
pub mod service;
pub mod workflow;

pub use router::{init_gate_passes_router, init_leaves_router};
