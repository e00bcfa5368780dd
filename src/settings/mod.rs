//! Schema-less settings documents.
//!
//! # Module Structure
//!
//! ```text
//! settings/
//! ├── value      # FieldValue codec (bool / int / 6-decimal float)
//! ├── infer      # Range inference from field names
//! ├── field      # Field: value + load-time value + range + line
//! ├── edit       # EditSet batches submitted by the UI
//! ├── document   # Line-oriented parser (ParsedDocument)
//! ├── patch      # Line-exact serializer
//! ├── merge      # Structural merge via quick-xml
//! ├── keyvalue   # KEY=VALUE line files
//! └── defaults   # Built-in stock document
//! ```
//!
//! Two write paths exist. Callers holding a fresh [`ParsedDocument`] use
//! [`patch::apply`], which reproduces the original byte for byte except for
//! modified lines. Callers with only a `{name: value}` map use
//! [`merge::merge`].

pub mod defaults;
pub mod document;
pub mod edit;
pub mod field;
pub mod infer;
pub mod keyvalue;
pub mod merge;
pub mod patch;
pub mod value;

pub use defaults::{DEFAULT_FIELDS, DEFAULT_ROOT_TAG, DEFAULT_ROOT_VERSION, default_document};
pub use document::{ParseError, ParsedDocument, RootTag, parse};
pub use edit::{EditError, EditReport, EditSet, EditValue};
pub use field::Field;
pub use infer::{Bounds, FieldRange, infer_range};
pub use keyvalue::{get_key, set_key};
pub use merge::{MergeError, MergeOutcome, merge, read_values, reconcile};
pub use patch::{LineChange, changed_lines};
pub use value::{FieldKind, FieldValue, decode, encode};
