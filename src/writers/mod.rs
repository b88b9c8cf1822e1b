pub mod durable;
pub mod grid_writer;
pub mod provenance_writer;

pub use durable::write_durably;
pub use grid_writer::{GridFileInfo, GridWriter};
pub use provenance_writer::{ProvenanceRecord, ProvenanceWriter};
