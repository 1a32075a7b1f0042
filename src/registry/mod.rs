//! Explicit startup registry of declared types and the scanner that classifies them.

mod scanner;
mod types;

pub use scanner::{ScanResult, Scanner};
pub use types::{Declaration, Registry, Tag, TypeEntry};
