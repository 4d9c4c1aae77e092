//! Comment selection.
//!
//! A run translates the union of two sets drawn from the comments that have
//! not been annotated yet:
//!
//! - the **rank set**: the top `percent`% by like count (rounded up)
//! - the **threshold set**: every comment with at least `like_threshold` likes
//!
//! A pure percentile misses a list with a single standout comment, and a pure
//! threshold misses lists where nothing clears the bar. The union covers both.

use crate::comment::CommentRecord;
use std::collections::HashSet;

pub const DEFAULT_PERCENT: u32 = 20;
pub const DEFAULT_LIKE_THRESHOLD: u64 = 1000;

/// Selection parameters, read fresh for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    percent: u32,
    like_threshold: u64,
}

impl SelectionConfig {
    /// Build a selection config. `percent` is clamped to `1..=100`.
    pub fn new(percent: u32, like_threshold: u64) -> Self {
        Self {
            percent: percent.clamp(1, 100),
            like_threshold,
        }
    }

    pub fn percent(&self) -> u32 {
        self.percent
    }

    pub fn like_threshold(&self) -> u64 {
        self.like_threshold
    }

    /// Size of the rank set for `candidates` unannotated records.
    pub fn top_count(&self, candidates: usize) -> usize {
        if candidates == 0 {
            return 0;
        }
        let scaled = candidates as u64 * u64::from(self.percent);
        scaled.div_ceil(100) as usize
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PERCENT, DEFAULT_LIKE_THRESHOLD)
    }
}

/// Choose which records to translate.
///
/// Annotated records are never selected. The result is ordered by like count
/// (descending, stable on input order) and holds at most one record per text.
pub fn select<'a>(records: &'a [CommentRecord], cfg: &SelectionConfig) -> Vec<&'a CommentRecord> {
    let mut candidates: Vec<&CommentRecord> =
        records.iter().filter(|r| !r.is_annotated()).collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    // sort_by is stable, so ties keep extraction order
    candidates.sort_by(|a, b| b.popularity().cmp(&a.popularity()));

    let top_count = cfg.top_count(candidates.len());
    let mut seen: HashSet<&str> = HashSet::new();

    candidates
        .into_iter()
        .enumerate()
        .filter(|(rank, record)| *rank < top_count || record.popularity() >= cfg.like_threshold())
        .map(|(_, record)| record)
        .filter(|record| seen.insert(record.text()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::SourceHandle;
    use proptest::prelude::*;
    use std::collections::HashSet;

    // ==================== Helper Functions ====================

    fn records_with_likes(likes: &[u64]) -> Vec<CommentRecord> {
        likes
            .iter()
            .enumerate()
            .map(|(i, l)| CommentRecord::new(format!("댓글 {}", i), *l, SourceHandle(i)))
            .collect()
    }

    fn likes_of(selected: &[&CommentRecord]) -> Vec<u64> {
        selected.iter().map(|r| r.popularity()).collect()
    }

    // ==================== SelectionConfig Tests ====================

    #[test]
    fn test_config_defaults() {
        let cfg = SelectionConfig::default();
        assert_eq!(cfg.percent(), 20);
        assert_eq!(cfg.like_threshold(), 1000);
    }

    #[test]
    fn test_config_clamps_percent() {
        assert_eq!(SelectionConfig::new(0, 0).percent(), 1);
        assert_eq!(SelectionConfig::new(250, 0).percent(), 100);
    }

    #[test]
    fn test_top_count_rounds_up() {
        let cfg = SelectionConfig::new(20, 0);
        assert_eq!(cfg.top_count(0), 0);
        assert_eq!(cfg.top_count(1), 1);
        assert_eq!(cfg.top_count(5), 1);
        assert_eq!(cfg.top_count(6), 2);
        assert_eq!(cfg.top_count(10), 2);
    }

    // ==================== Selection Tests ====================

    #[test]
    fn test_select_empty_input() {
        let cfg = SelectionConfig::default();
        assert!(select(&[], &cfg).is_empty());
    }

    #[test]
    fn test_select_rank_and_threshold_overlap() {
        let records = records_with_likes(&[1000, 900, 800, 700, 600, 500, 400, 300, 200, 100]);
        let cfg = SelectionConfig::new(20, 950);

        let selected = select(&records, &cfg);
        assert_eq!(likes_of(&selected), vec![1000, 900]);
    }

    #[test]
    fn test_select_threshold_extends_rank_set() {
        let records = records_with_likes(&[100, 5000, 200, 3000, 50]);
        let cfg = SelectionConfig::new(20, 1000);

        // Rank set is just the top record; 3000 joins through the threshold
        let selected = select(&records, &cfg);
        assert_eq!(likes_of(&selected), vec![5000, 3000]);
    }

    #[test]
    fn test_select_rank_set_without_threshold_hits() {
        let records = records_with_likes(&[10, 30, 20]);
        let cfg = SelectionConfig::new(50, 1000);

        let selected = select(&records, &cfg);
        assert_eq!(likes_of(&selected), vec![30, 20]);
    }

    #[test]
    fn test_select_threshold_is_inclusive() {
        let records = records_with_likes(&[2000, 1000, 999]);
        let cfg = SelectionConfig::new(1, 1000);

        let selected = select(&records, &cfg);
        assert_eq!(likes_of(&selected), vec![2000, 1000]);
    }

    #[test]
    fn test_select_zero_threshold_selects_everything() {
        let records = records_with_likes(&[0, 0, 3]);
        let cfg = SelectionConfig::new(1, 0);

        assert_eq!(select(&records, &cfg).len(), 3);
    }

    #[test]
    fn test_select_skips_annotated_records() {
        let mut records = records_with_likes(&[500, 400, 300]);
        records[0].mark_annotated();
        let cfg = SelectionConfig::new(34, 10_000);

        // Percentile is computed over the two unannotated records
        let selected = select(&records, &cfg);
        assert_eq!(likes_of(&selected), vec![400]);
    }

    #[test]
    fn test_select_all_annotated_is_empty() {
        let records: Vec<CommentRecord> = records_with_likes(&[5000, 10])
            .into_iter()
            .map(CommentRecord::annotated)
            .collect();
        let cfg = SelectionConfig::new(100, 0);

        assert!(select(&records, &cfg).is_empty());
    }

    #[test]
    fn test_select_dedups_by_text() {
        let records = vec![
            CommentRecord::new("같은 댓글", 3000, SourceHandle(0)),
            CommentRecord::new("같은 댓글", 2000, SourceHandle(1)),
            CommentRecord::new("다른 댓글", 10, SourceHandle(2)),
        ];
        let cfg = SelectionConfig::new(1, 1000);

        let selected = select(&records, &cfg);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].handle(), SourceHandle(0));
    }

    #[test]
    fn test_select_ties_keep_input_order() {
        let records = records_with_likes(&[5, 5, 5, 5]);
        let cfg = SelectionConfig::new(50, 1000);

        let selected = select(&records, &cfg);
        let handles: Vec<SourceHandle> = selected.iter().map(|r| r.handle()).collect();
        assert_eq!(handles, vec![SourceHandle(0), SourceHandle(1)]);
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_select_covers_rank_set(
            likes in proptest::collection::vec(0u64..10_000, 1..60),
            percent in 1u32..=100,
            threshold in 0u64..20_000,
        ) {
            let records = records_with_likes(&likes);
            let cfg = SelectionConfig::new(percent, threshold);
            let selected = select(&records, &cfg);

            let expected_min = (likes.len() * percent as usize).div_ceil(100);
            prop_assert!(selected.len() >= expected_min);
        }

        #[test]
        fn prop_select_includes_every_record_over_threshold(
            likes in proptest::collection::vec(0u64..10_000, 0..60),
            percent in 1u32..=100,
            threshold in 0u64..10_000,
        ) {
            let records = records_with_likes(&likes);
            let cfg = SelectionConfig::new(percent, threshold);
            let selected = select(&records, &cfg);

            for record in records.iter().filter(|r| r.popularity() >= threshold) {
                prop_assert!(selected.iter().any(|s| s.handle() == record.handle()));
            }
        }

        #[test]
        fn prop_select_output_is_sorted_and_unique(
            likes in proptest::collection::vec(0u64..10_000, 0..60),
            percent in 1u32..=100,
        ) {
            let records = records_with_likes(&likes);
            let selected = select(&records, &SelectionConfig::new(percent, 5_000));

            prop_assert!(selected.windows(2).all(|w| w[0].popularity() >= w[1].popularity()));
            let texts: HashSet<&str> = selected.iter().map(|r| r.text()).collect();
            prop_assert_eq!(texts.len(), selected.len());
        }
    }
}
