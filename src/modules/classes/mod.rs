pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::{init_classes_router, init_sections_router, init_subjects_router};
