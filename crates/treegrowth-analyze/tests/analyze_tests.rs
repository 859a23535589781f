use std::fs;
use std::path::Path;

use filetime::{FileTime, set_file_mtime};
use tempfile::TempDir;
use treegrowth_analyze::{
    GrowthCalculator, Metric, MetricDelta, MetricsAggregator, ReleaseOrder, ReleaseSummary,
    SourceFolderMatrix, compare_first_last, source_folders,
};
use treegrowth_scan::{ScanConfig, scan_release};

fn write(root: &Path, rel: &str, bytes: usize) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'x'; bytes]).unwrap();
}

/// `demo/1.0`: 3 files, 600 bytes. `demo/2.0`: 5 files, 900 bytes.
fn create_demo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let v1 = temp.path().join("1.0");
    write(&v1, "main.py", 200);
    write(&v1, "app/core.py", 200);
    write(&v1, "app/util.py", 200);

    let v2 = temp.path().join("2.0");
    write(&v2, "main.py", 200);
    write(&v2, "app/core.py", 200);
    write(&v2, "app/util.py", 200);
    write(&v2, "app/net/http.py", 150);
    write(&v2, "app/net/tcp.py", 150);
    temp
}

fn summarize(root: &Path, release: &str) -> (ReleaseSummary, treegrowth_analyze::NodeTable) {
    let mut tree = scan_release(&ScanConfig::new(root.join(release))).unwrap();
    let metrics = MetricsAggregator::new()
        .aggregate(release, &mut tree.table)
        .unwrap();
    (metrics.summary, tree.table)
}

#[test]
fn test_demo_growth() {
    let demo = create_demo();
    let mut summaries = vec![
        summarize(demo.path(), "2.0").0,
        summarize(demo.path(), "1.0").0,
    ];

    ReleaseOrder::Name.sort(&mut summaries);
    GrowthCalculator::new().apply(&mut summaries);

    assert_eq!(summaries[0].release, "1.0");
    assert_eq!(summaries[0].num_files, 3);
    assert_eq!(summaries[1].num_files, 5);

    let first = summaries[0].growth.as_ref().unwrap();
    assert!(first.get(Metric::NumFiles).absolute.is_none());

    let second = summaries[1].growth.as_ref().unwrap();
    let files = second.get(Metric::NumFiles);
    assert_eq!(files.absolute, Some(MetricDelta::Count(2)));
    assert_eq!(files.percent, Some(66.67));
    assert_eq!(second.get(Metric::SizeBytes).percent, Some(50.0));
}

#[test]
fn test_demo_first_last() {
    let demo = create_demo();
    let summaries = vec![
        summarize(demo.path(), "1.0").0,
        summarize(demo.path(), "2.0").0,
    ];

    let cmp = compare_first_last("demo", &summaries).unwrap();
    assert_eq!(cmp.num_files_first, 3);
    assert_eq!(cmp.num_files_last, 5);
    assert_eq!(cmp.growth, 2);
    assert_eq!(cmp.growth_pct, Some(66.67));
}

#[test]
fn test_excluded_tests_folder_appears_nowhere() {
    let temp = TempDir::new().unwrap();
    let release = temp.path().join("1.0");
    write(&release, "lib/a.py", 10);
    write(&release, "tests/test_a.py", 10);
    write(&release, "tests/fixtures/data.py", 10);

    let (summary, table) = summarize(temp.path(), "1.0");

    assert!(table.nodes().iter().all(|n| !n.path.split('/').any(|s| s == "tests")));
    assert_eq!(summary.num_files, 1);
    // root and lib
    assert_eq!(summary.num_folders, 2);
    assert_eq!(summary.num_source_folders, 1);
}

#[test]
fn test_matrix_joins_stable_ids() {
    let demo = create_demo();
    let mut matrix = SourceFolderMatrix::new();
    for release in ["1.0", "2.0"] {
        let (_, table) = summarize(demo.path(), release);
        matrix.add_release(release, source_folders(&table));
    }

    // root, app, app/net
    assert_eq!(matrix.len(), 3);
    let rows: Vec<_> = matrix.rows().collect();
    assert_eq!(rows[0].level, 0);
    assert_eq!(rows[0].cells, vec![Some(1), Some(1)]);
    assert_eq!(rows[1].cells, vec![Some(2), Some(2)]);
    assert_eq!(rows[2].level, 2);
    assert_eq!(rows[2].cells, vec![None, Some(2)]);
}

#[test]
fn test_modified_order_overrides_names() {
    let demo = create_demo();
    // 2.0 was released first on disk, 1.0 afterwards.
    set_file_mtime(demo.path().join("2.0"), FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
    set_file_mtime(demo.path().join("1.0"), FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let scanned = vec![
        summarize(demo.path(), "1.0").0,
        summarize(demo.path(), "2.0").0,
    ];
    let names = |s: &[ReleaseSummary]| -> Vec<String> { s.iter().map(|r| r.release.clone()).collect() };

    let mut by_name = scanned.clone();
    ReleaseOrder::Name.sort(&mut by_name);
    assert_eq!(names(&by_name[..]), vec!["1.0", "2.0"]);

    let mut by_mtime = scanned;
    ReleaseOrder::Modified.sort(&mut by_mtime);
    assert_eq!(names(&by_mtime[..]), vec!["2.0", "1.0"]);

    GrowthCalculator::new().apply(&mut by_mtime);
    let growth = by_mtime[1].growth.as_ref().unwrap().get(Metric::NumFiles);
    assert_eq!(growth.absolute, Some(MetricDelta::Count(-2)));
    assert_eq!(growth.percent, Some(-40.0));
}
