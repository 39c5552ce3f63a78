pub mod base;
pub mod context;
pub mod error;
pub mod registry;
pub mod slug;

pub use base::{AllowAll, PermissionGate, RecordValidator};
pub use context::{Operation, WriteContext};
pub use error::ValidateError;
pub use registry::{validators_for, ValidatorFn};
pub use slug::{slugify, SlugRecordValidator};
