//! Syntax Layers: incremental multi-language parse trees
//!
//! A [`LanguageTree`] parses a shared [`SourceBuffer`] with a root grammar,
//! discovers regions written in other grammars ("injections", e.g. a
//! `<script>` body inside HTML) by running an injection query over each
//! freshly parsed tree, and keeps one child layer per injected language up
//! to date as the source is edited.
//!
//! # Architecture
//!
//! - Layers live in an arena owned by the root and are addressed by
//!   [`LayerId`].
//! - One parser serves the whole tree. It is reconfigured for each layer
//!   through [`SharedParser`], so parsing is strictly sequential and
//!   depth-first.
//! - The grammar registry, parser and query engine sit behind
//!   [`SyntaxBackend`]; [`ts::TreeSitterBackend`] is the tree-sitter
//!   implementation.
//!
//! # Example
//!
//! ```no_run
//! use syntax_layers::{Callbacks, LanguageTree, SourceBuffer};
//! use syntax_layers::ts::TreeSitterBackend;
//!
//! # fn main() -> Result<(), syntax_layers::LayerError> {
//! let source = SourceBuffer::new("<script>let x = 1;</script>");
//! let mut tree = LanguageTree::new(TreeSitterBackend::builtin(), source.clone(), "html")?;
//! tree.register_callbacks(Callbacks::new().on_child_added(|event| {
//!     println!("found {} injection", event.language);
//! }));
//! tree.parse()?;
//!
//! let delta = source.replace(8..18, "let y = 2;");
//! let changed = tree.on_bytes(&delta)?;
//! println!("{} ranges changed", changed.len());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod callbacks;
pub mod config;
pub mod errors;
pub mod injection;
pub mod language;
pub mod parser;
pub mod range;
pub mod source;
pub mod tree;
pub mod ts;

// Re-exports
pub use backend::{InjectionQuery, ParseOutput, ParserPrimitive, SyntaxBackend, SyntaxTree};
pub use callbacks::{Callbacks, ChildEvent};
pub use config::{load_from_path, load_from_str, ConfigError, RegistryConfig};
pub use errors::LayerError;
pub use injection::{CaptureKind, CaptureSite, Injection, InjectionMap, InjectionMatch};
pub use language::LanguageId;
pub use parser::{ConfiguredParser, SharedParser};
pub use range::{EditDelta, Point, TextRange};
pub use source::{BufferId, SourceBuffer};
pub use tree::{Descendants, LanguageLayer, LanguageTree, LayerId};
