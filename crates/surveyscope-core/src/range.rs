use thiserror::Error;

use crate::model::{RangeScope, ScoreRange};

/// Returns the first range, in iteration order, whose inclusive bounds hold
/// the rounded percentage. Overlaps are not detected; pass ranges through
/// [`ranges_for_scope`] for a deterministic order.
pub fn pick_range<'a, I>(percentage: f64, ranges: I) -> Option<&'a ScoreRange>
where
    I: IntoIterator<Item = &'a ScoreRange>,
{
    if !percentage.is_finite() {
        return None;
    }
    // half rounds up
    let rounded = (percentage + 0.5).floor();
    ranges.into_iter().find(|range| range.contains(rounded))
}

/// Ranges configured for `scope`, sorted by `min_score` (then `max_score`).
pub fn ranges_for_scope<'a>(ranges: &'a [ScoreRange], scope: &RangeScope) -> Vec<&'a ScoreRange> {
    let mut scoped = ranges
        .iter()
        .filter(|range| &range.scope == scope)
        .collect::<Vec<_>>();
    scoped.sort_by_key(|range| (range.min_score, range.max_score));
    scoped
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeIssue {
    #[error("range {min}-{max} must satisfy 0 <= min < max <= 100")]
    InvalidBounds { min: i32, max: i32 },

    #[error("range {min}-{max} overlaps an earlier range ending at {previous_max}")]
    Overlap {
        min: i32,
        max: i32,
        previous_max: i32,
    },

    #[error("scores {from}-{to} are not covered by any range")]
    Gap { from: i32, to: i32 },
}

impl RangeIssue {
    /// Gaps only leave some scores without a description; the other issues
    /// make classification order-dependent or impossible.
    pub const fn is_blocking(&self) -> bool {
        !matches!(self, Self::Gap { .. })
    }
}

/// Authoring-time check of one scope's ranges. Scoring never calls this.
pub fn audit_ranges<'a, I>(ranges: I) -> Vec<RangeIssue>
where
    I: IntoIterator<Item = &'a ScoreRange>,
{
    let mut issues = Vec::new();
    let mut valid = Vec::new();
    for range in ranges {
        if range.min_score < 0 || range.max_score > 100 || range.min_score >= range.max_score {
            issues.push(RangeIssue::InvalidBounds {
                min: range.min_score,
                max: range.max_score,
            });
        } else {
            valid.push((range.min_score, range.max_score));
        }
    }
    if valid.is_empty() {
        return issues;
    }
    valid.sort_unstable();

    let mut covered_to: Option<i32> = None;
    for (min, max) in valid {
        match covered_to {
            None if min > 0 => issues.push(RangeIssue::Gap {
                from: 0,
                to: min - 1,
            }),
            Some(previous_max) if min <= previous_max => issues.push(RangeIssue::Overlap {
                min,
                max,
                previous_max,
            }),
            Some(previous_max) if min > previous_max + 1 => issues.push(RangeIssue::Gap {
                from: previous_max + 1,
                to: min - 1,
            }),
            _ => {}
        }
        covered_to = Some(covered_to.map_or(max, |prev| prev.max(max)));
    }
    if let Some(end) = covered_to.filter(|end| *end < 100) {
        issues.push(RangeIssue::Gap {
            from: end + 1,
            to: 100,
        });
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overall(min: i32, max: i32, description: &str) -> ScoreRange {
        ScoreRange::new(RangeScope::Overall, min, max).with_description(description)
    }

    #[test]
    fn bounds_are_inclusive() {
        let ranges = vec![overall(0, 49, "low"), overall(50, 100, "high")];
        assert_eq!(pick_range(49.0, &ranges).map(|r| r.description.as_str()), Some("low"));
        assert_eq!(pick_range(50.0, &ranges).map(|r| r.description.as_str()), Some("high"));
        assert_eq!(pick_range(0.0, &ranges).map(|r| r.description.as_str()), Some("low"));
        assert_eq!(pick_range(100.0, &ranges).map(|r| r.description.as_str()), Some("high"));
    }

    #[test]
    fn percentage_is_rounded_before_matching() {
        let ranges = vec![overall(0, 49, "low"), overall(50, 100, "high")];
        assert_eq!(pick_range(49.49, &ranges).map(|r| r.description.as_str()), Some("low"));
        assert_eq!(pick_range(49.5, &ranges).map(|r| r.description.as_str()), Some("high"));
    }

    #[test]
    fn gaps_and_empty_sets_match_nothing() {
        let ranges = vec![overall(0, 40, "low"), overall(60, 100, "high")];
        assert!(pick_range(50.0, &ranges).is_none());
        assert!(pick_range(50.0, &[]).is_none());
        assert!(pick_range(f64::NAN, &ranges).is_none());
    }

    #[test]
    fn first_match_wins_on_overlap() {
        let ranges = vec![overall(40, 100, "late"), overall(0, 60, "early")];
        assert_eq!(pick_range(50.0, &ranges).map(|r| r.description.as_str()), Some("late"));
        let sorted = ranges_for_scope(&ranges, &RangeScope::Overall);
        assert_eq!(pick_range(50.0, sorted).map(|r| r.description.as_str()), Some("early"));
    }

    #[test]
    fn scope_filter_keeps_only_matching_ranges() {
        let ranges = vec![
            ScoreRange::new(RangeScope::category("c1"), 50, 100),
            overall(0, 100, "all"),
            ScoreRange::new(RangeScope::category("c1"), 0, 49),
            ScoreRange::new(RangeScope::category("c2"), 0, 100),
        ];
        let scoped = ranges_for_scope(&ranges, &RangeScope::category("c1"));
        let bounds = scoped
            .iter()
            .map(|r| (r.min_score, r.max_score))
            .collect::<Vec<_>>();
        assert_eq!(bounds, vec![(0, 49), (50, 100)]);
    }

    #[test]
    fn audit_accepts_a_clean_partition() {
        let ranges = vec![overall(50, 100, ""), overall(0, 49, "")];
        assert!(audit_ranges(&ranges).is_empty());
    }

    #[test]
    fn audit_reports_bounds_overlaps_and_gaps() {
        let ranges = vec![
            overall(10, 40, ""),
            overall(30, 60, ""),
            overall(70, 90, ""),
            overall(80, 80, ""),
        ];
        let issues = audit_ranges(&ranges);
        assert_eq!(
            issues,
            vec![
                RangeIssue::InvalidBounds { min: 80, max: 80 },
                RangeIssue::Gap { from: 0, to: 9 },
                RangeIssue::Overlap {
                    min: 30,
                    max: 60,
                    previous_max: 40
                },
                RangeIssue::Gap { from: 61, to: 69 },
                RangeIssue::Gap { from: 91, to: 100 },
            ]
        );
        assert!(issues.iter().any(RangeIssue::is_blocking));
        assert_eq!(
            RangeIssue::Gap { from: 61, to: 69 }.to_string(),
            "scores 61-69 are not covered by any range"
        );
    }
}
