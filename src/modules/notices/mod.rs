pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::{init_newsletters_router, init_notices_router};
