//! Remote drive collaborators: catalog listing and chunked download.

pub mod catalog;

pub use catalog::DriveCatalog;
