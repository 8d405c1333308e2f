//! Sparse per-file "value holds from line N until superseded" index.
//!
//! Shared by `@define` pragma scoping and `@line` remapping.

use rustc_hash::FxHashMap;

/// One region: `value` is in effect from `line` onward.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Region<T> {
    pub line: u32,
    pub value: T,
}

/// Per-file sorted, deduplicated `(line, value)` regions.
///
/// `find` returns the nearest region at or before the queried line:
/// the last write from that line forward wins.
#[derive(Clone, Debug, Default)]
pub struct RegionMap<T> {
    files: FxHashMap<String, Vec<Region<T>>>,
}

impl<T> RegionMap<T> {
    pub fn new() -> Self {
        RegionMap {
            files: FxHashMap::default(),
        }
    }

    /// Record `value` as in effect from `line` onward in `file`.
    ///
    /// A second write to the same line replaces the first.
    pub fn add(&mut self, file: &str, line: u32, value: T) {
        let regions = self.files.entry(file.to_string()).or_default();
        match regions.binary_search_by_key(&line, |r| r.line) {
            Ok(index) => regions[index].value = value,
            Err(index) => regions.insert(index, Region { line, value }),
        }
    }

    /// The region in effect at `line`: nearest entry at or before it.
    pub fn find(&self, file: &str, line: u32) -> Option<&Region<T>> {
        let regions = self.files.get(file)?;
        match regions.binary_search_by_key(&line, |r| r.line) {
            Ok(index) => Some(&regions[index]),
            Err(0) => None,
            Err(index) => Some(&regions[index - 1]),
        }
    }

    /// All regions recorded for `file`, in line order.
    pub fn regions(&self, file: &str) -> &[Region<T>] {
        self.files.get(file).map_or(&[], Vec::as_slice)
    }

    /// Drop all regions recorded for `file`.
    pub fn clear_file(&mut self, file: &str) {
        self.files.remove(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn find_returns_nearest_at_or_before() {
        let mut map = RegionMap::new();
        map.add("a", 10, "ten");
        map.add("a", 20, "twenty");
        assert_eq!(map.find("a", 5), None);
        assert_eq!(map.find("a", 10).map(|r| r.value), Some("ten"));
        assert_eq!(map.find("a", 15).map(|r| r.value), Some("ten"));
        assert_eq!(map.find("a", 20).map(|r| r.value), Some("twenty"));
        assert_eq!(map.find("a", 99).map(|r| r.value), Some("twenty"));
        assert_eq!(map.find("b", 10), None);
    }

    #[test]
    fn same_line_overwrites() {
        let mut map = RegionMap::new();
        map.add("a", 3, 1);
        map.add("a", 3, 2);
        assert_eq!(map.regions("a").len(), 1);
        assert_eq!(map.find("a", 3).map(|r| r.value), Some(2));
    }

    #[test]
    fn out_of_order_inserts_stay_sorted() {
        let mut map = RegionMap::new();
        map.add("a", 30, 3);
        map.add("a", 10, 1);
        map.add("a", 20, 2);
        let lines: Vec<u32> = map.regions("a").iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![10, 20, 30]);
    }
}
