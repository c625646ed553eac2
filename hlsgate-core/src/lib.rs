pub mod bootstrap;
pub mod config;
pub mod error;
pub mod key;
pub mod logging;
pub mod presign;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use key::{ReferenceKind, StorageKey};
pub use presign::{PresignService, PresignedUrl};
pub use storage::{AddressingStyle, ObjectStore};
