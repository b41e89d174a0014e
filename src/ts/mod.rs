//! Tree-sitter backend for [`LanguageTree`](crate::LanguageTree).
//!
//! Grammars come from `ast-grep-language`; injection queries come from the
//! [`LanguageRegistry`], either the built-in set or one loaded from
//! configuration.

pub mod backend;
pub mod cache;
pub mod parser;
pub mod query;
pub mod registry;

pub use backend::TreeSitterBackend;
pub use cache::QueryCache;
pub use parser::{TsLanguage, TsParser};
pub use query::{queries, TsInjectionQuery};
pub use registry::{LanguageEntry, LanguageRegistry};
