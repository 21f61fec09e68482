pub mod controller;
pub mod grading;
pub mod model;
pub mod router;
pub mod service;

pub use router::init_exams_router;
