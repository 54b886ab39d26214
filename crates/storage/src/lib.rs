#![forbid(unsafe_code)]

pub mod bundle;
pub mod catalog;
pub mod file;
pub mod repository;

pub use bundle::{DirectoryBundle, ResourceBundle};
pub use repository::{Storage, StorageError};
