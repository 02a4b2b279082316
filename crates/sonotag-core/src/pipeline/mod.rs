//! Audio tagging pipeline components.
//!
//! - **discovery**: Find audio files in directories
//! - **validate**: Pre-decode checks
//! - **classifier**: Per-file validate → decode → normalize → embed → rank
//! - **driver**: Batch orchestration with per-file isolation and deadlines

pub mod classifier;
pub mod discovery;
pub mod driver;
pub mod validate;

pub use classifier::FileClassifier;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use driver::{ensure_root_dir, BatchDriver, FileProgress};
pub use validate::Validator;
