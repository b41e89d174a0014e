//! The one parser a tree owns, lent out one configured use at a time.
//!
//! Every layer reuses the same parser regardless of grammar. The only way to
//! parse is to [`configure`](SharedParser::configure) it, which yields a
//! [`ConfiguredParser`] borrowing the parser exclusively; parsing consumes
//! that capability. Holding the borrow across a parse is what keeps two
//! layers from interleaving reconfiguration and parsing.

use crate::backend::{ParseOutput, ParserPrimitive};
use crate::errors::LayerError;
use crate::range::TextRange;

pub struct SharedParser<P> {
    parser: P,
    parses: u64,
}

impl<P: ParserPrimitive> SharedParser<P> {
    pub fn new(parser: P) -> Self {
        Self { parser, parses: 0 }
    }

    /// Point the parser at `language` and `ranges` for exactly one parse.
    pub fn configure(
        &mut self,
        language: &P::Language,
        ranges: &[TextRange],
    ) -> Result<ConfiguredParser<'_, P>, LayerError> {
        self.parser.configure(language, ranges)?;
        Ok(ConfiguredParser { shared: self })
    }

    /// Total parses performed through this parser.
    pub fn parse_count(&self) -> u64 {
        self.parses
    }
}

/// A parser configured for one layer; consumed by [`parse`](Self::parse).
#[must_use = "a configured parser does nothing until parse() is called"]
pub struct ConfiguredParser<'a, P> {
    shared: &'a mut SharedParser<P>,
}

impl<P: ParserPrimitive> ConfiguredParser<'_, P> {
    pub fn parse(
        self,
        source: &str,
        previous: Option<&P::Tree>,
    ) -> Result<ParseOutput<P::Tree>, LayerError> {
        let output = self.shared.parser.parse(source, previous)?;
        self.shared.parses += 1;
        Ok(output)
    }
}
