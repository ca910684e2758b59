//! Storage services for the ipocket inventory
//!
//! CRUD over vendors, projects, hosts, tags and IP assets. This is the
//! black-box storage API the import pipeline and the (out-of-tree) HTTP
//! layer both consume.

pub mod services;

pub use services::*;
