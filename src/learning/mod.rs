//! Learning pages: the course catalog and career paths by interest.

pub mod careers;
pub mod courses;
pub mod routes;

pub use careers::{CareerPath, CareerPaths};
pub use courses::{Course, CourseCatalog, CourseLevel, Workshop};
