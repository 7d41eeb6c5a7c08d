//! Core implementation of revecors, a crate for curating draft genome scale metabolic
//! models and converting them into metabolite graphs for reverse ecology.
pub mod batch;
pub mod configuration;
pub mod curation;
pub mod graph;
pub mod io;
pub mod metabolic_model;
mod utils;
