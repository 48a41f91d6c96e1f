//! 完了マーカーの集約
//!
//! 各ホストの完了マーカーファイル（空白区切りのトークン）を和集合にまとめ、
//! 全ホストへ再配布する。競合解決はしない。

use std::collections::BTreeSet;

/// 完了済み作業のトークン集合（常にソート済み）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSet {
    markers: BTreeSet<String>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// マーカーファイルの内容を取り込み、新たに増えた件数を返す
    pub fn absorb(&mut self, content: &str) -> usize {
        let before = self.markers.len();
        self.markers
            .extend(content.split_whitespace().map(str::to_string));
        self.markers.len() - before
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }

    /// 配布用のファイル内容（ソート済み、改行区切り）
    pub fn render(&self) -> String {
        self.markers
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> FromIterator<&'a str> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = Self::new();
        for content in iter {
            set.absorb(content);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_hosts() {
        let set: MarkerSet = ["run-3\nrun-1", "run-2 run-1", ""].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.render(), "run-1\nrun-2\nrun-3");
    }

    #[test]
    fn test_absorb_reports_new_markers() {
        let mut set = MarkerSet::new();
        assert_eq!(set.absorb("a b"), 2);
        assert_eq!(set.absorb("b c"), 1);
        assert!(set.contains("c"));
    }

    #[test]
    fn test_republish_is_idempotent() {
        let first: MarkerSet = ["x y", "z"].into_iter().collect();
        let published = first.render();

        // 配布済みの内容を各ホストから再収集しても集合は変わらない
        let second: MarkerSet = [published.as_str(), published.as_str()]
            .into_iter()
            .collect();
        assert_eq!(first, second);
        assert_eq!(second.render(), published);
    }
}
