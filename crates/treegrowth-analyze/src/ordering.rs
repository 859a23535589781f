//! Release ordering policies.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use treegrowth_core::PipelineConfig;

use crate::summary::{LevelSummary, ReleaseSummary};

/// Something that belongs to a named, timestamped release.
pub trait Release {
    /// Release name.
    fn release_name(&self) -> &str;
    /// Modification time of the release root.
    fn modified(&self) -> SystemTime;
}

impl Release for ReleaseSummary {
    fn release_name(&self) -> &str {
        &self.release
    }

    fn modified(&self) -> SystemTime {
        self.modified
    }
}

/// How the releases of one application are put in chronological order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOrder {
    /// By modification time of the release root; ties broken by name.
    #[default]
    Modified,
    /// Lexically by release name.
    Name,
}

impl ReleaseOrder {
    /// Policy configured for an application.
    pub fn for_application(config: &PipelineConfig, application: &str) -> Self {
        if config.orders_by_name(application) {
            ReleaseOrder::Name
        } else {
            ReleaseOrder::Modified
        }
    }

    /// Sort releases in place.
    pub fn sort<T: Release>(&self, items: &mut [T]) {
        match self {
            ReleaseOrder::Modified => items.sort_by(|a, b| {
                a.modified()
                    .cmp(&b.modified())
                    .then_with(|| a.release_name().cmp(b.release_name()))
            }),
            ReleaseOrder::Name => items.sort_by(|a, b| a.release_name().cmp(b.release_name())),
        }
    }

    /// Sort level rows to follow the order of `ordered`, then by level.
    ///
    /// Rows of releases missing from `ordered` go last.
    pub fn sort_levels(levels: &mut [LevelSummary], ordered: &[ReleaseSummary]) {
        let position: HashMap<&str, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, s)| (s.release.as_str(), i))
            .collect();
        levels.sort_by_key(|l| {
            (
                position.get(l.release.as_str()).copied().unwrap_or(usize::MAX),
                l.level,
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn summary(release: &str, secs: u64) -> ReleaseSummary {
        ReleaseSummary::empty(release, SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn names(items: &[ReleaseSummary]) -> Vec<&str> {
        items.iter().map(|s| s.release.as_str()).collect()
    }

    #[test]
    fn test_sort_by_modified_and_name() {
        let mut rows = vec![summary("b", 10), summary("a", 30), summary("c", 20)];

        ReleaseOrder::Modified.sort(&mut rows);
        assert_eq!(names(&rows), vec!["b", "c", "a"]);

        ReleaseOrder::Name.sort(&mut rows);
        assert_eq!(names(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_modified_ties_break_by_name() {
        let mut rows = vec![summary("2.0", 5), summary("1.0", 5)];
        ReleaseOrder::Modified.sort(&mut rows);
        assert_eq!(names(&rows), vec!["1.0", "2.0"]);
    }

    #[test]
    fn test_policies_agree_on_monotonic_names() {
        let mut by_time = vec![summary("v3", 300), summary("v1", 100), summary("v2", 200)];
        let mut by_name = by_time.clone();

        ReleaseOrder::Modified.sort(&mut by_time);
        ReleaseOrder::Name.sort(&mut by_name);
        assert_eq!(names(&by_time), names(&by_name));
    }

    #[test]
    fn test_sort_levels_follows_release_order() {
        let ordered = vec![summary("2.0", 1), summary("1.0", 2)];
        let level = |release: &str, level| LevelSummary {
            release: release.to_string(),
            level,
            num_files: 0,
            num_folders: 0,
        };
        let mut levels = vec![level("1.0", 0), level("2.0", 1), level("2.0", 0), level("x", 0)];

        ReleaseOrder::sort_levels(&mut levels, &ordered);
        let keys: Vec<(&str, u32)> = levels.iter().map(|l| (l.release.as_str(), l.level)).collect();
        assert_eq!(keys, vec![("2.0", 0), ("2.0", 1), ("1.0", 0), ("x", 0)]);
    }

    #[test]
    fn test_for_application() {
        let mut config = PipelineConfig::default();
        config.order_by_name.insert("qbittorrent".to_string());

        assert_eq!(ReleaseOrder::for_application(&config, "qbittorrent"), ReleaseOrder::Name);
        assert_eq!(ReleaseOrder::for_application(&config, "fresco"), ReleaseOrder::Modified);
        assert_eq!("name".parse::<ReleaseOrder>().unwrap(), ReleaseOrder::Name);
        assert_eq!(ReleaseOrder::Modified.to_string(), "modified");
    }
}
