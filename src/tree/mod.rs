//! The layer tree: one root grammar plus the injected grammars found in it.
//!
//! Layers live in an arena owned by [`LanguageTree`] and are addressed by
//! [`LayerId`]. Ids carry a generation, so an id kept across a removal never
//! aliases a layer created later in the same slot.

mod traverse;


pub use traverse::Descendants;

use crate::backend::{SyntaxBackend, SyntaxTree};
use crate::callbacks::{CallbackRegistry, Callbacks, ChildEvent};
use crate::errors::LayerError;
use crate::injection::{self, InjectionMap};
use crate::language::LanguageId;
use crate::parser::SharedParser;
use crate::range::{normalize_ranges, scope_contains, EditDelta, TextRange};
use crate::source::SourceBuffer;
use indexmap::IndexMap;
use slab::Slab;
use std::fmt;
use tracing::{debug, trace, warn};

/// Layers at this depth never get children of their own.
pub const MAX_INJECTION_DEPTH: usize = 32;

/// Stable handle to a layer in a [`LanguageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId {
    slot: usize,
    generation: u64,
}

impl LayerId {
    #[cfg(test)]
    pub(crate) fn from_raw(slot: usize) -> Self {
        Self {
            slot,
            generation: 0,
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

/// One grammar responsible for one region of the source.
pub struct LanguageLayer<B: SyntaxBackend> {
    generation: u64,
    language_id: LanguageId,
    language: B::Language,
    included_ranges: Vec<TextRange>,
    valid: bool,
    tree: Option<B::Tree>,
    children: IndexMap<LanguageId, LayerId>,
    parent: Option<LayerId>,
    depth: usize,
    injection_query: Option<B::Query>,
}

impl<B: SyntaxBackend> LanguageLayer<B> {
    fn new(
        backend: &B,
        language_id: LanguageId,
        parent: Option<LayerId>,
        depth: usize,
        generation: u64,
    ) -> Result<Self, LayerError> {
        let language = backend.load_language(&language_id)?;

        let injection_query = match backend.injection_query(&language_id, &language) {
            Ok(query) => Some(query),
            Err(err @ LayerError::QueryUnavailable { .. }) => {
                trace!(language = %language_id, "{err}");
                None
            }
            Err(err) if err.is_query_error() => {
                warn!(language = %language_id, "injections disabled: {err}");
                None
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            generation,
            language_id,
            language,
            included_ranges: Vec::new(),
            valid: false,
            tree: None,
            children: IndexMap::new(),
            parent,
            depth,
            injection_query,
        })
    }

    pub fn language(&self) -> &LanguageId {
        &self.language_id
    }

    /// Regions this layer parses. Empty means the whole source.
    pub fn included_ranges(&self) -> &[TextRange] {
        &self.included_ranges
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tree from the last successful parse.
    pub fn tree(&self) -> Option<&B::Tree> {
        self.tree.as_ref()
    }

    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn child(&self, language: &str) -> Option<LayerId> {
        self.children.get(language).copied()
    }

    /// Children in the order they were attached.
    pub fn children(&self) -> impl Iterator<Item = (&LanguageId, LayerId)> {
        self.children.iter().map(|(language, id)| (language, *id))
    }

    pub fn has_injection_query(&self) -> bool {
        self.injection_query.is_some()
    }

    /// Whether `range` lies within this layer's region.
    pub fn contains(&self, range: &TextRange) -> bool {
        scope_contains(&self.included_ranges, range)
    }
}

/// The root coordinator: owns every layer, the shared parser and the
/// callback registries.
pub struct LanguageTree<B: SyntaxBackend> {
    backend: B,
    source: SourceBuffer,
    parser: SharedParser<B::Parser>,
    callbacks: CallbackRegistry,
    layers: Slab<LanguageLayer<B>>,
    root: LayerId,
    next_generation: u64,
}

impl<B: SyntaxBackend> LanguageTree<B> {
    /// Create a tree whose root parses `source` as `language`.
    ///
    /// Fails with [`LayerError::LanguageUnavailable`] when the grammar cannot
    /// be loaded. Nothing is parsed until [`parse`](Self::parse).
    pub fn new(
        backend: B,
        source: SourceBuffer,
        language: impl Into<LanguageId>,
    ) -> Result<Self, LayerError> {
        let language = language.into();
        let root_layer = LanguageLayer::new(&backend, language.clone(), None, 0, 0)?;
        let parser = SharedParser::new(backend.new_parser()?);

        let mut layers = Slab::new();
        let root = LayerId {
            slot: layers.insert(root_layer),
            generation: 0,
        };
        debug!(layer = %root, language = %language, "created language tree");

        Ok(Self {
            backend,
            source,
            parser,
            callbacks: CallbackRegistry::default(),
            layers,
            root,
            next_generation: 1,
        })
    }

    pub fn root(&self) -> LayerId {
        self.root
    }

    pub fn source(&self) -> &SourceBuffer {
        &self.source
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of live layers, the root included.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Parses performed by the shared parser over the tree's lifetime.
    pub fn parse_count(&self) -> u64 {
        self.parser.parse_count()
    }

    pub fn layer(&self, id: LayerId) -> Option<&LanguageLayer<B>> {
        self.layers
            .get(id.slot)
            .filter(|layer| layer.generation == id.generation)
    }

    fn get(&self, id: LayerId) -> Result<&LanguageLayer<B>, LayerError> {
        self.layer(id).ok_or(LayerError::UnknownLayer(id))
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut LanguageLayer<B>, LayerError> {
        slot_mut(&mut self.layers, id)
    }

    pub fn language(&self, id: LayerId) -> Option<&LanguageId> {
        self.layer(id).map(LanguageLayer::language)
    }

    pub fn included_ranges(&self, id: LayerId) -> Option<&[TextRange]> {
        self.layer(id).map(LanguageLayer::included_ranges)
    }

    pub fn tree(&self, id: LayerId) -> Option<&B::Tree> {
        self.layer(id).and_then(LanguageLayer::tree)
    }

    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.layer(id).and_then(LanguageLayer::parent)
    }

    pub fn depth(&self, id: LayerId) -> Option<usize> {
        self.layer(id).map(LanguageLayer::depth)
    }

    pub fn child(&self, id: LayerId, language: &str) -> Option<LayerId> {
        self.layer(id).and_then(|layer| layer.child(language))
    }

    /// Direct children of a layer as `(language, id)` pairs.
    pub fn children(&self, id: LayerId) -> Vec<(LanguageId, LayerId)> {
        self.layer(id)
            .map(|layer| {
                layer
                    .children()
                    .map(|(language, child)| (language.clone(), child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the layer's tree reflects the current source and ranges.
    ///
    /// Unknown ids are never valid.
    pub fn is_valid(&self, id: LayerId) -> bool {
        self.layer(id).is_some_and(LanguageLayer::is_valid)
    }

    /// Whether `range` lies within the region `id` is responsible for.
    pub fn contains(&self, id: LayerId, range: &TextRange) -> bool {
        self.layer(id).is_some_and(|layer| layer.contains(range))
    }

    /// Mark a layer and all of its descendants stale.
    pub fn invalidate(&mut self, id: LayerId) -> Result<(), LayerError> {
        let stale: Vec<LayerId> = self.descendants(id, true).collect();
        if stale.is_empty() {
            return Err(LayerError::UnknownLayer(id));
        }
        for layer in stale {
            self.get_mut(layer)?.valid = false;
        }
        Ok(())
    }

    /// Restrict a layer to `ranges`; an empty list lifts the restriction.
    pub fn set_included_ranges(
        &mut self,
        id: LayerId,
        ranges: Vec<TextRange>,
    ) -> Result<(), LayerError> {
        self.get_mut(id)?.included_ranges = normalize_ranges(ranges);
        self.invalidate(id)
    }

    /// Attach a fresh child layer for `language`, replacing any existing one.
    pub fn add_child(
        &mut self,
        parent: LayerId,
        language: impl Into<LanguageId>,
    ) -> Result<LayerId, LayerError> {
        let language = language.into();
        let depth = self.get(parent)?.depth + 1;
        let generation = self.next_generation;
        let layer = LanguageLayer::new(
            &self.backend,
            language.clone(),
            Some(parent),
            depth,
            generation,
        )?;
        self.next_generation += 1;

        self.remove_child(parent, language.as_str())?;

        let child = LayerId {
            slot: self.layers.insert(layer),
            generation,
        };
        let parent_layer = self.get_mut(parent)?;
        parent_layer.children.insert(language.clone(), child);
        parent_layer.valid = false;

        debug!(parent = %parent, layer = %child, language = %language, "added child layer");
        self.callbacks.child_added(&ChildEvent {
            parent,
            child,
            language,
        });
        Ok(child)
    }

    /// Detach and destroy the child for `language`, if there is one.
    pub fn remove_child(&mut self, parent: LayerId, language: &str) -> Result<(), LayerError> {
        let Some(child) = self.get_mut(parent)?.children.shift_remove(language) else {
            return Ok(());
        };

        let language = self
            .layer(child)
            .map(|layer| layer.language_id.clone())
            .unwrap_or_else(|| LanguageId::from(language));
        self.destroy_subtree(child);
        self.get_mut(parent)?.valid = false;

        debug!(parent = %parent, layer = %child, language = %language, "removed child layer");
        self.callbacks.child_removed(&ChildEvent {
            parent,
            child,
            language,
        });
        Ok(())
    }

    /// Destroy every descendant of `id` and drop its own tree.
    ///
    /// The layer itself stays attached; use [`remove_child`](Self::remove_child)
    /// on its parent to detach it.
    pub fn destroy(&mut self, id: LayerId) -> Result<(), LayerError> {
        let children: Vec<LayerId> = self
            .get_mut(id)?
            .children
            .drain(..)
            .map(|(_, child)| child)
            .collect();
        for child in children {
            self.destroy_subtree(child);
        }
        let layer = self.get_mut(id)?;
        layer.tree = None;
        layer.valid = false;
        Ok(())
    }

    fn destroy_subtree(&mut self, id: LayerId) {
        let doomed: Vec<LayerId> = self.descendants(id, true).collect();
        for layer in doomed {
            trace!(layer = %layer, "destroying layer");
            self.layers.remove(layer.slot);
        }
    }

    /// Register handlers in the tree-wide registries.
    pub fn register_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks.register(callbacks);
    }

    /// Depth-first walk below `id`, optionally starting with `id` itself.
    pub fn descendants(&self, id: LayerId, include_self: bool) -> Descendants<'_, B> {
        Descendants::new(self, id, include_self)
    }

    /// Visit `id`'s subtree depth-first.
    pub fn for_each(
        &self,
        id: LayerId,
        include_self: bool,
        mut visitor: impl FnMut(LayerId, &LanguageLayer<B>),
    ) {
        for layer_id in self.descendants(id, include_self) {
            if let Some(layer) = self.layer(layer_id) {
                visitor(layer_id, layer);
            }
        }
    }

    /// Visit every parsed tree in the whole tree.
    pub fn for_each_tree(&self, mut visitor: impl FnMut(LayerId, &LanguageLayer<B>, &B::Tree)) {
        self.for_each(self.root, true, |id, layer| {
            if let Some(tree) = &layer.tree {
                visitor(id, layer, tree);
            }
        });
    }

    /// The deepest layer whose region contains `range`.
    pub fn language_for_range(&self, range: &TextRange) -> LayerId {
        let mut current = self.root;
        'descend: loop {
            let Some(layer) = self.layer(current) else {
                return current;
            };
            for (_, child) in layer.children() {
                if self.contains(child, range) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Parse the whole tree. See [`parse_layer`](Self::parse_layer).
    pub fn parse(&mut self) -> Result<Vec<TextRange>, LayerError> {
        self.parse_layer(self.root)
    }

    /// Bring `id` and its subtree up to date and return what changed.
    ///
    /// Valid layers are not re-parsed, so repeated calls without an edit
    /// return an empty list. `changedtree` fires only when something was
    /// parsed.
    pub fn parse_layer(&mut self, id: LayerId) -> Result<Vec<TextRange>, LayerError> {
        let mut changes = Vec::new();
        if self.parse_into(id, &mut changes)? {
            self.callbacks.changedtree(id, &changes);
        }
        Ok(changes)
    }

    /// Entry point for edits made to the source buffer.
    ///
    /// Re-parses synchronously, then fires `bytes` followed by `changedtree`.
    /// When the root fails to parse, `bytes` still fires before the error is
    /// returned. Deltas from another buffer are rejected untouched.
    pub fn on_bytes(&mut self, delta: &EditDelta) -> Result<Vec<TextRange>, LayerError> {
        let expected = self.source.id();
        if delta.buffer != expected {
            warn!(%expected, got = %delta.buffer, "edit reported for a different buffer");
            return Err(LayerError::ForeignEdit {
                expected,
                got: delta.buffer,
            });
        }
        debug!(
            changedtick = delta.changedtick,
            old = %delta.old_range(),
            new = %delta.new_range(),
            "source edited"
        );

        for (_, layer) in self.layers.iter_mut() {
            if let Some(tree) = layer.tree.as_mut() {
                tree.edit(delta);
            }
        }
        self.invalidate(self.root)?;

        let mut changes = Vec::new();
        let parsed = self.parse_into(self.root, &mut changes);

        self.callbacks.bytes(delta);
        parsed?;
        self.callbacks.changedtree(self.root, &changes);
        Ok(changes)
    }

    /// The host is done with the buffer: notify observers and drop every
    /// injected layer.
    pub fn on_detach(&mut self) -> Result<(), LayerError> {
        debug!(buffer = %self.source.id(), "detaching language tree");
        self.callbacks.detach(self.source.id());
        self.destroy(self.root)
    }

    /// Returns whether anything was parsed.
    fn parse_into(
        &mut self,
        id: LayerId,
        changes: &mut Vec<TextRange>,
    ) -> Result<bool, LayerError> {
        let layer = self.get(id)?;
        if layer.valid {
            let children: Vec<LayerId> = layer.children.values().copied().collect();
            let mut parsed = false;
            for child in children {
                parsed |= self.parse_child(child, changes);
            }
            return Ok(parsed);
        }

        self.parse_own_tree(id, changes)?;
        let injections = if self.get(id)?.depth < MAX_INJECTION_DEPTH {
            self.discover_injections(id)?
        } else {
            warn!(layer = %id, "injection depth limit reached");
            InjectionMap::new()
        };
        self.reconcile(id, injections, changes)?;
        self.get_mut(id)?.valid = true;
        Ok(true)
    }

    /// Child failures leave that child stale without failing the parent.
    fn parse_child(&mut self, child: LayerId, changes: &mut Vec<TextRange>) -> bool {
        match self.parse_into(child, changes) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(layer = %child, "child layer failed to parse: {err}");
                false
            }
        }
    }

    fn parse_own_tree(
        &mut self,
        id: LayerId,
        changes: &mut Vec<TextRange>,
    ) -> Result<(), LayerError> {
        let source = self.source.text();
        let layer = slot_mut(&mut self.layers, id)?;

        let output = self
            .parser
            .configure(&layer.language, &layer.included_ranges)?
            .parse(&source, layer.tree.as_ref())?;

        trace!(
            layer = %id,
            language = %layer.language_id,
            ranges = layer.included_ranges.len(),
            changes = output.changed_ranges.len(),
            "parsed layer"
        );
        changes.extend(output.changed_ranges);
        layer.tree = Some(output.tree);
        Ok(())
    }

    fn discover_injections(&self, id: LayerId) -> Result<InjectionMap, LayerError> {
        let layer = self.get(id)?;
        let (Some(query), Some(tree)) = (&layer.injection_query, &layer.tree) else {
            return Ok(InjectionMap::new());
        };
        let source = self.source.text();
        Ok(injection::discover(
            query,
            tree,
            &source,
            &layer.included_ranges,
        ))
    }

    /// Make `id`'s children match `injections` exactly, parsing each one.
    fn reconcile(
        &mut self,
        id: LayerId,
        injections: InjectionMap,
        changes: &mut Vec<TextRange>,
    ) -> Result<(), LayerError> {
        let stale: Vec<LanguageId> = self
            .get(id)?
            .children
            .keys()
            .filter(|language| !injections.contains(language.as_str()))
            .cloned()
            .collect();

        for (language, ranges) in injections {
            let existing = self.get(id)?.child(language.as_str());
            let child = match existing {
                Some(child) => child,
                None => match self.add_child(id, language.clone()) {
                    Ok(child) => child,
                    Err(err) => {
                        debug!(layer = %id, language = %language, "skipping injection: {err}");
                        continue;
                    }
                },
            };
            self.set_included_ranges(child, ranges)?;
            self.parse_child(child, changes);
        }

        for language in stale {
            self.remove_child(id, language.as_str())?;
        }
        Ok(())
    }
}

fn slot_mut<B: SyntaxBackend>(
    layers: &mut Slab<LanguageLayer<B>>,
    id: LayerId,
) -> Result<&mut LanguageLayer<B>, LayerError> {
    layers
        .get_mut(id.slot)
        .filter(|layer| layer.generation == id.generation)
        .ok_or(LayerError::UnknownLayer(id))
}

impl<B: SyntaxBackend> fmt::Debug for LanguageTree<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.for_each(self.root, true, |id, layer| {
            list.entry(&format_args!(
                "{}{} {} ({} ranges){}",
                "  ".repeat(layer.depth),
                layer.language_id,
                id,
                layer.included_ranges.len(),
                if layer.valid { "" } else { " stale" },
            ));
        });
        list.finish()
    }
}
