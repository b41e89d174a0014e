use super::{LanguageTree, LayerId};
use crate::backend::SyntaxBackend;

/// Depth-first, pre-order iterator over layer ids.
///
/// Children are visited in attachment order. An unknown starting id yields
/// nothing.
pub struct Descendants<'a, B: SyntaxBackend> {
    tree: &'a LanguageTree<B>,
    stack: Vec<LayerId>,
}

impl<'a, B: SyntaxBackend> Descendants<'a, B> {
    pub(super) fn new(tree: &'a LanguageTree<B>, start: LayerId, include_self: bool) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
        };
        if tree.layer(start).is_none() {
            return iter;
        }
        if include_self {
            iter.stack.push(start);
        } else {
            iter.push_children(start);
        }
        iter
    }

    fn push_children(&mut self, id: LayerId) {
        if let Some(layer) = self.tree.layer(id) {
            let start = self.stack.len();
            self.stack.extend(layer.children.values().copied());
            self.stack[start..].reverse();
        }
    }
}

impl<B: SyntaxBackend> Iterator for Descendants<'_, B> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        let id = self.stack.pop()?;
        self.push_children(id);
        Some(id)
    }
}
