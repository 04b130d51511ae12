//! On-disk control directory I/O (C2).

pub mod atomic;
pub mod control_dir;
pub mod store;

pub use store::{DiskStore, RealDiskStore};
