pub mod model;
pub mod step;
pub mod timeline;
