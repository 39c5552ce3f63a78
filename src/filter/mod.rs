pub mod csv;
pub mod error;
pub mod group;
pub mod json_value;
pub mod query;
pub mod sets;

pub use csv::{CharFilter, PkInFilter, TagsFilter};
pub use error::FilterError;
pub use group::ActiveGroupFilter;
pub use json_value::JsonValueFilter;
pub use query::{Query, SqlResult};
pub use sets::{CategoryFilterSet, DocumentFilterSet, FileFilterSet, TagFilterSet};
