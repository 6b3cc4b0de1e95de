//! Dialog persistence abstractions.
//!
//! The `DialogStore` trait is implemented by the infrastructure layer.

pub mod store;
