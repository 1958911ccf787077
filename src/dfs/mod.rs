//! Acorn DFS disk-image codec (C8-C11): catalog bit layout, single-sided
//! image building, double-sided composition, and template patching.

pub mod builder;
pub mod catalog;
pub mod dsd;
pub mod patch;

pub use builder::{boot_file_contents, qualified_name, DfsImage};
pub use catalog::{Catalog, CatalogEntry};
pub use dsd::{build_dsd, PhysicalOrdering};
pub use patch::patch_template;
