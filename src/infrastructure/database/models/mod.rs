pub mod vector_record_model;

pub use vector_record_model::*;
