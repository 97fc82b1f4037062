//! Domain layer: catalog entities and the error taxonomy shared by the
//! scraping pipeline.

pub mod entities;
pub mod error;
