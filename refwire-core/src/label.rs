//! Label sets: canonical capability tags attached to components and
//! injection points.

use std::fmt;
use std::sync::Arc;

use refwire_support::rendering::render_labels;

/// An immutable, sorted, duplicate-free set of labels.
///
/// Two label sets are equal as sets iff their canonical sequences are
/// equal, so the derived `Eq`/`Hash` can be used for cache keys.
///
/// The empty set means "no constraint": it is a subset of every set,
/// while a non-empty set is never a subset of the empty one.
///
/// ```
/// use refwire_core::label::LabelSet;
///
/// let query = LabelSet::parse("db");
/// let candidate = LabelSet::new(["primary", "db", ""]);
/// assert_eq!(candidate.as_slice(), ["db", "primary"]);
/// assert!(query.is_subset(&candidate));
/// assert!(!candidate.is_subset(&query));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    /// Builds the canonical form: empty entries dropped, duplicates
    /// removed, sorted lexicographically.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels: Vec<String> = labels
            .into_iter()
            .filter(|s| !s.as_ref().is_empty())
            .map(|s| s.as_ref().to_owned())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        Self { labels: labels.into() }
    }

    /// Parses a space-separated annotation such as `"db primary"`.
    pub fn parse(tag: &str) -> Self {
        Self::new(tag.split(' '))
    }

    /// The empty ("no constraint") label set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when every label of `self` also occurs in `candidate`.
    ///
    /// Both sides are sorted, so a single forward cursor over `candidate`
    /// is enough: for each query label it advances until it finds the label
    /// or passes it.
    pub fn is_subset(&self, candidate: &LabelSet) -> bool {
        if self.labels.is_empty() {
            return true;
        }
        if candidate.labels.is_empty() {
            return false;
        }
        let mut cursor = 0;
        for wanted in self.labels.iter() {
            loop {
                let Some(have) = candidate.labels.get(cursor) else {
                    return false;
                };
                if have == wanted {
                    break;
                }
                if have > wanted {
                    return false;
                }
                cursor += 1;
            }
            cursor += 1;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Debug for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelSet{}", render_labels(self.as_slice()))
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_labels(self.as_slice()))
    }
}
