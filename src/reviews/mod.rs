//! Verified reviews and book ratings

pub mod aggregate;
pub mod gate;
pub mod service;

pub use aggregate::{recompute, summarize, RatingSummary};
pub use gate::{Admission, AdmissionPolicy};
pub use service::{NewReview, ReviewEdit, ReviewService, MAX_RATING, MIN_RATING};
