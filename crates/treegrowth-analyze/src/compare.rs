//! First-versus-last release comparison.

use serde::{Deserialize, Serialize};

use crate::growth::percent_change;
use crate::summary::ReleaseSummary;

/// File counts of an application's first and last release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstLastComparison {
    pub application: String,
    pub first_release: String,
    pub last_release: String,
    pub num_files_first: u64,
    pub num_files_last: u64,
    /// `num_files_last - num_files_first`.
    pub growth: i64,
    /// Percent growth, undefined when the first release has no files.
    pub growth_pct: Option<f64>,
}

/// Compare the first and last of `summaries`, which must be in release
/// order. Returns `None` for an application without releases.
pub fn compare_first_last(
    application: &str,
    summaries: &[ReleaseSummary],
) -> Option<FirstLastComparison> {
    let first = summaries.first()?;
    let last = summaries.last()?;

    Some(FirstLastComparison {
        application: application.to_string(),
        first_release: first.release.clone(),
        last_release: last.release.clone(),
        num_files_first: first.num_files,
        num_files_last: last.num_files,
        growth: last.num_files as i64 - first.num_files as i64,
        growth_pct: percent_change(first.num_files as f64, last.num_files as f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn summary(release: &str, num_files: u64) -> ReleaseSummary {
        let mut s = ReleaseSummary::empty(release, SystemTime::UNIX_EPOCH);
        s.num_files = num_files;
        s
    }

    #[test]
    fn test_compare_first_last() {
        let rows = vec![summary("1.0", 40), summary("1.1", 45), summary("2.0", 50)];
        let cmp = compare_first_last("demo", &rows).unwrap();

        assert_eq!(cmp.first_release, "1.0");
        assert_eq!(cmp.last_release, "2.0");
        assert_eq!(cmp.growth, 10);
        assert_eq!(cmp.growth_pct, Some(25.0));
    }

    #[test]
    fn test_single_release_has_zero_growth() {
        let cmp = compare_first_last("demo", &[summary("1.0", 3)]).unwrap();
        assert_eq!(cmp.growth, 0);
        assert_eq!(cmp.growth_pct, Some(0.0));
    }

    #[test]
    fn test_no_releases() {
        assert!(compare_first_last("demo", &[]).is_none());
    }
}
