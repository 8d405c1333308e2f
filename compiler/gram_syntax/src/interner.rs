//! String interning.
//!
//! Identifiers, literal values, and prose fragments are interned once so
//! the tree stores compact [`Name`] handles and the checker compares
//! names by id. Interned strings live for the interner's lifetime; the
//! backing storage is leaked on first intern, which is what gives out
//! `&'static str` without unsafe code.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Handle to an interned string.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct Name(u32);

impl Name {
    /// The pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

struct Inner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Interior-mutable string interner.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringInterner {
    pub fn new() -> Self {
        let mut map = FxHashMap::default();
        map.insert("", 0u32);
        StringInterner {
            inner: RwLock::new(Inner {
                map,
                strings: vec![""],
            }),
        }
    }

    /// Intern a string, returning its handle.
    pub fn intern(&self, text: &str) -> Name {
        if let Some(&index) = self.inner.read().map.get(text) {
            return Name(index);
        }
        let mut inner = self.inner.write();
        // Re-check: another caller may have interned between locks.
        if let Some(&index) = inner.map.get(text) {
            return Name(index);
        }
        let leaked: &'static str = Box::leak(text.to_string().into_boxed_str());
        let index = inner.strings.len() as u32;
        inner.strings.push(leaked);
        inner.map.insert(leaked, index);
        Name(index)
    }

    /// Look up a handle's text.
    pub fn resolve(&self, name: Name) -> &'static str {
        self.inner
            .read()
            .strings
            .get(name.0 as usize)
            .copied()
            .unwrap_or("")
    }

    /// Look up a string without interning it.
    pub fn get(&self, text: &str) -> Option<Name> {
        self.inner.read().map.get(text).map(|&index| Name(index))
    }

    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the empty string is always present
    }
}
