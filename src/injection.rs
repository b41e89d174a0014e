//! Injection discovery: turning query matches into per-language regions.
//!
//! A match resolves to a language in one of two ways:
//!
//! - a capture named `lang` supplies the language as its source text, and
//!   the first other capture marks the content region;
//! - otherwise the name of the first capture is the language and its node
//!   is the content region.
//!
//! Matches that resolve to neither are skipped.

use crate::backend::InjectionQuery;
use crate::language::LanguageId;
use crate::range::{clip_to_scope, normalize_ranges, TextRange};
use indexmap::IndexMap;

/// Name of the capture whose text names the injected language.
pub const LANG_CAPTURE: &str = "lang";

/// A named capture reported by a query match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSite {
    pub name: String,
    pub range: TextRange,
}

impl CaptureSite {
    pub fn new(name: impl Into<String>, range: TextRange) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn kind(&self) -> CaptureKind<'_> {
        CaptureKind::classify(&self.name)
    }
}

/// One query match with its captures in query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionMatch {
    pub pattern: usize,
    pub captures: Vec<CaptureSite>,
}

/// The role a capture plays in language resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind<'a> {
    /// Captured text names the language.
    Lang,
    /// Captured node is content; the capture name is the fallback language.
    Content(&'a str),
}

impl<'a> CaptureKind<'a> {
    pub fn classify(name: &'a str) -> Self {
        if name == LANG_CAPTURE {
            CaptureKind::Lang
        } else {
            CaptureKind::Content(name)
        }
    }
}

/// A resolved injection: a language and one region it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub language: LanguageId,
    pub range: TextRange,
}

/// Resolve a single match, or `None` when no language can be determined.
pub fn resolve_match(m: &InjectionMatch, source: &str) -> Option<Injection> {
    let mut lang = None;
    let mut content = None;

    for capture in &m.captures {
        match capture.kind() {
            CaptureKind::Lang => {
                if lang.is_none() {
                    lang = Some(capture.range);
                }
            }
            CaptureKind::Content(name) => {
                if content.is_none() {
                    content = Some((name, capture.range));
                }
            }
        }
    }

    let (content_name, range) = content?;
    let language = match lang {
        Some(lang_range) => {
            let text = source.get(lang_range.byte_range())?.trim();
            if text.is_empty() {
                return None;
            }
            LanguageId::from(text)
        }
        None => LanguageId::from(content_name),
    };

    Some(Injection { language, range })
}

/// Languages found in a layer, each with its ordered, disjoint regions.
///
/// Iteration follows the order languages were first discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionMap {
    regions: IndexMap<LanguageId, Vec<TextRange>>,
}

impl InjectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `range` for `language`, clipped to `scope`.
    ///
    /// Regions that fall completely outside the scope are dropped.
    pub fn insert(&mut self, language: LanguageId, range: TextRange, scope: &[TextRange]) {
        let clipped = clip_to_scope(&range, scope);
        if clipped.is_empty() {
            return;
        }
        self.regions.entry(language).or_default().extend(clipped);
    }

    pub fn get(&self, language: &str) -> Option<&[TextRange]> {
        self.regions.get(language).map(Vec::as_slice)
    }

    pub fn contains(&self, language: &str) -> bool {
        self.regions.contains_key(language)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageId> {
        self.regions.keys()
    }

    fn finish(mut self) -> Self {
        for ranges in self.regions.values_mut() {
            *ranges = normalize_ranges(std::mem::take(ranges));
        }
        self
    }
}

impl IntoIterator for InjectionMap {
    type Item = (LanguageId, Vec<TextRange>);
    type IntoIter = indexmap::map::IntoIter<LanguageId, Vec<TextRange>>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

/// Run `query` over a layer's own tree and group the results by language.
pub fn discover<Q: InjectionQuery>(
    query: &Q,
    tree: &Q::Tree,
    source: &str,
    scope: &[TextRange],
) -> InjectionMap {
    let mut map = InjectionMap::new();

    for m in query.matches(tree, source, scope) {
        match resolve_match(&m, source) {
            Some(injection) => map.insert(injection.language, injection.range, scope),
            None => tracing::trace!(pattern = m.pattern, "skipping unresolved injection match"),
        }
    }

    map.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, start: usize, end: usize) -> CaptureSite {
        CaptureSite::new(name, TextRange::bytes(start, end))
    }

    struct FixedMatches(Vec<InjectionMatch>);

    impl InjectionQuery for FixedMatches {
        type Tree = ();

        fn matches(&self, _: &(), _: &str, _: &[TextRange]) -> Vec<InjectionMatch> {
            self.0.clone()
        }
    }

    #[test]
    fn lang_capture_takes_precedence() {
        let source = "python: print(1)";
        let m = InjectionMatch {
            pattern: 0,
            captures: vec![site("content", 8, 16), site("lang", 0, 6)],
        };

        let injection = resolve_match(&m, source).unwrap();
        assert_eq!(injection.language, "python");
        assert_eq!(injection.range, TextRange::bytes(8, 16));
    }

    #[test]
    fn first_capture_name_is_fallback_language() {
        let m = InjectionMatch {
            pattern: 1,
            captures: vec![site("javascript", 3, 9), site("css", 10, 12)],
        };

        let injection = resolve_match(&m, "").unwrap();
        assert_eq!(injection.language, "javascript");
        assert_eq!(injection.range.byte_range(), 3..9);
    }

    #[test]
    fn unresolvable_matches_are_none() {
        let only_lang = InjectionMatch {
            pattern: 0,
            captures: vec![site("lang", 0, 4)],
        };
        assert!(resolve_match(&only_lang, "rust").is_none());

        let blank_lang = InjectionMatch {
            pattern: 0,
            captures: vec![site("lang", 0, 2), site("content", 3, 5)],
        };
        assert!(resolve_match(&blank_lang, "   body").is_none());

        let empty = InjectionMatch {
            pattern: 0,
            captures: vec![],
        };
        assert!(resolve_match(&empty, "").is_none());
    }

    #[test]
    fn discover_groups_disjoint_regions_per_language() {
        let query = FixedMatches(vec![
            InjectionMatch {
                pattern: 0,
                captures: vec![site("python", 50, 60)],
            },
            InjectionMatch {
                pattern: 0,
                captures: vec![site("lang", 0, 0)],
            },
            InjectionMatch {
                pattern: 0,
                captures: vec![site("python", 10, 20)],
            },
            InjectionMatch {
                pattern: 1,
                captures: vec![site("css", 30, 40)],
            },
        ]);

        let map = discover(&query, &(), "", &[]);
        let languages: Vec<_> = map.languages().map(LanguageId::as_str).collect();
        assert_eq!(languages, vec!["python", "css"]);
        assert_eq!(
            map.get("python").unwrap(),
            &[TextRange::bytes(10, 20), TextRange::bytes(50, 60)]
        );
    }

    #[test]
    fn discover_clips_regions_to_scope() {
        let query = FixedMatches(vec![
            InjectionMatch {
                pattern: 0,
                captures: vec![site("python", 5, 15)],
            },
            InjectionMatch {
                pattern: 0,
                captures: vec![site("css", 40, 50)],
            },
        ]);

        let map = discover(&query, &(), "", &[TextRange::bytes(10, 30)]);
        assert_eq!(map.get("python").unwrap(), &[TextRange::bytes(10, 15)]);
        assert!(!map.contains("css"));
    }
}
