//! Community pages: forums, mentor directory, testimonials.

pub mod forums;
pub mod mentors;
pub mod routes;
pub mod testimonials;

pub use forums::{ForumBoard, ForumPost, VoteDirection};
pub use mentors::{Mentor, MentorDirectory};
pub use testimonials::{Testimonial, TestimonialWall};
