use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::Ordering;
use tempfile::tempdir;

use asset_duper_core::analysis::{find_duplicates, resolve};
use asset_duper_core::inventory::{InventoryBuilder, Termination};
use asset_duper_core::listing::{ListingPage, ObjectLister, PagedKeys};
use asset_duper_core::{parse_key, AppConfig, BatchStrategy, Error, ReconcileEngine, SilentReporter};

const UUID_A: &str = "E70CC37E-AA88-4D59-831A-B9C37C662207";
const UUID_B: &str = "00005048-8BA2-45A2-A9525155916759FB";
const UUID_C: &str = "9F1C2B3A-0000-4D59-831A-1234567890AB";

/// Object-store stand-in serving fixed pages and counting requests.
struct FakeLister {
    pages: Vec<Vec<String>>,
    requests: Rc<Cell<usize>>,
    fail_on_page: Option<usize>,
}

impl FakeLister {
    fn new(pages: Vec<Vec<String>>) -> Self {
        Self {
            pages,
            requests: Rc::new(Cell::new(0)),
            fail_on_page: None,
        }
    }
}

impl ObjectLister for FakeLister {
    fn list_page(&mut self, _prefix: &str, continuation: Option<&str>) -> Result<ListingPage, Error> {
        let page: usize = continuation.map_or(0, |token| token.parse().unwrap());
        self.requests.set(self.requests.get() + 1);
        if self.fail_on_page == Some(page) {
            return Err(Error::Listing(format!("page {} timed out", page)));
        }
        let next = page + 1;
        Ok(ListingPage {
            keys: self.pages[page].clone(),
            next_continuation: (next < self.pages.len()).then(|| next.to_string()),
        })
    }
}

/// Bucket layout with one identity duplicated across two batches and one
/// repeated inside a single batch.
fn sample_keys() -> Vec<String> {
    vec![
        format!("br_assets/Batch_1/{}/IMG_0001.jpg", UUID_A),
        format!("br_assets/Batch_1/{}/IMG_0002.jpg", UUID_A),
        format!("br_assets/Batch_1/{}/IMG_0003.jpg", UUID_B),
        format!("br_assets/Batch_2/{}/IMG_0001.jpg", UUID_A.to_lowercase()),
        format!("br_assets/Batch_1/{}/", UUID_C),
        format!("br_assets/Batch_1/{}/notes.txt", UUID_C),
        format!("br_assets/Batch_1/{}/notes.txt", UUID_C.replace('-', "")),
        "br_assets/readme.md".to_string(),
    ]
}

fn ok_records(keys: &[String]) -> Vec<Result<String, Error>> {
    keys.iter().cloned().map(Ok).collect()
}

fn config_with_output(dir: &Path) -> AppConfig {
    AppConfig {
        output_dir: dir.to_string_lossy().into_owned(),
        report_prefix: "test_run".to_string(),
        ..AppConfig::default()
    }
}

fn read_report(paths: &[std::path::PathBuf], kind: &str) -> String {
    let suffix = format!("_{}.csv", kind);
    let path = paths
        .iter()
        .find(|p| p.to_string_lossy().ends_with(&suffix))
        .unwrap_or_else(|| panic!("no {} report in {:?}", kind, paths));
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_stored_raw_keys_reparse_to_their_identity() {
    let strategy = BatchStrategy::default();
    let build = InventoryBuilder::new(strategy.clone())
        .build(ok_records(&sample_keys()), &SilentReporter);

    assert!(!build.inventory.is_empty());
    for (identity, occurrences) in build.inventory.iter() {
        for occurrence in occurrences {
            let reparsed = parse_key(&occurrence.raw_key, &strategy).identity();
            assert_eq!(reparsed.as_ref(), Some(identity), "key {}", occurrence.raw_key);
        }
    }
}

#[test]
fn test_cancel_after_n_records_matches_n_record_build() {
    let keys = sample_keys();
    for n in 0..keys.len() {
        let builder = InventoryBuilder::new(BatchStrategy::default());
        let token = builder.cancel_token();
        let mut pulled = 0;
        let records = ok_records(&keys).into_iter().inspect(|_| {
            pulled += 1;
            if pulled == n {
                token.store(true, Ordering::SeqCst);
            }
        });
        if n == 0 {
            builder.cancel_token().store(true, Ordering::SeqCst);
        }
        let cancelled = builder.build(records, &SilentReporter);

        let expected = InventoryBuilder::new(BatchStrategy::default())
            .build(ok_records(&keys[..n]), &SilentReporter);

        assert!(matches!(cancelled.termination, Termination::Cancelled), "n = {}", n);
        assert_eq!(cancelled.counters.records_seen, n);
        assert_eq!(cancelled.counters, expected.counters);
        let got: Vec<_> = cancelled.inventory.occurrences().map(|o| o.raw_key.clone()).collect();
        let want: Vec<_> = expected.inventory.occurrences().map(|o| o.raw_key.clone()).collect();
        assert_eq!(got, want, "n = {}", n);
    }
}

#[test]
fn test_cancel_stops_paging() {
    let keys = sample_keys();
    let lister = FakeLister::new(keys.chunks(3).map(<[String]>::to_vec).collect());
    let requests = Rc::clone(&lister.requests);
    let mut paged = PagedKeys::new(lister, "br_assets/");

    let builder = InventoryBuilder::new(BatchStrategy::default());
    let token = builder.cancel_token();
    let mut pulled = 0;
    let records = paged.by_ref().inspect(|_| {
        pulled += 1;
        if pulled == 3 {
            token.store(true, Ordering::SeqCst);
        }
    });
    let build = builder.build(records, &SilentReporter);

    assert!(matches!(build.termination, Termination::Cancelled));
    assert_eq!(build.counters.records_seen, 3);
    assert_eq!(requests.get(), 1);
    assert_eq!(paged.pages_fetched(), 1);
}

#[test]
fn test_paged_listing_failure_keeps_earlier_pages() {
    let keys = sample_keys();
    let mut lister = FakeLister::new(keys.chunks(3).map(<[String]>::to_vec).collect());
    lister.fail_on_page = Some(1);
    let build = InventoryBuilder::new(BatchStrategy::default())
        .build(PagedKeys::new(lister, ""), &SilentReporter);

    assert!(matches!(build.failure(), Some(Error::Listing(_))));
    assert_eq!(build.counters.records_seen, 3);
    assert_eq!(build.inventory.occurrence_count(), 3);
}

#[test]
fn test_duplicates_and_resolution_over_listing() {
    let build = InventoryBuilder::new(BatchStrategy::default())
        .build(ok_records(&sample_keys()), &SilentReporter);

    let groups = find_duplicates(&build.inventory);
    // notes.txt repeats inside Batch_1 only and is not a cross-batch duplicate
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].identity.filename(), "IMG_0001.jpg");
    assert_eq!(groups[0].batches(), vec!["Batch_1", "Batch_2"]);

    let resolution = resolve(&groups, &build.batch_stats);
    assert_eq!(resolution.remove.len(), 1);
    assert_eq!(resolution.remove[0].batch(), Some("Batch_2"));
    assert_eq!(resolution.remove[0].kept_in_batch, Some("Batch_1"));
}

#[test]
fn test_engine_analyze_writes_all_reports() {
    let out = tempdir().unwrap();
    let engine = ReconcileEngine::new(config_with_output(out.path()));
    let result = engine
        .analyze(ok_records(&sample_keys()), "sample", &SilentReporter)
        .unwrap();

    assert!(matches!(result.termination, Termination::Exhausted));
    assert_eq!(result.counters.records_seen, 8);
    assert_eq!(result.counters.indexed, 6);
    assert_eq!(result.counters.skipped, 2);
    assert_eq!(result.identities, 4);
    assert_eq!(result.batches, 2);
    assert_eq!(result.duplicate_groups, 1);
    assert_eq!(result.removal_candidates, 1);
    assert_eq!(result.reports.len(), 7);
    assert!(result.reports.iter().all(|p| p.exists()));

    let simple = read_report(&result.reports, "removal_simple");
    assert_eq!(
        simple,
        format!("path\nbr_assets/Batch_2/{}/IMG_0001.jpg\n", UUID_A.to_lowercase())
    );

    let uuid_folders = read_report(&result.reports, "uuid_folders");
    assert!(uuid_folders.starts_with("Batch,UUID,File Count\n"));
    assert!(uuid_folders.contains(&format!("Batch_1,{},2\n", UUID_A)));

    let stats = read_report(&result.reports, "stats");
    assert!(stats.starts_with("Metric,Value\n"));
    assert!(stats.contains("Listing Status,complete"));
}

#[test]
fn test_engine_analyze_reports_partial_results_on_failure() {
    let out = tempdir().unwrap();
    let engine = ReconcileEngine::new(config_with_output(out.path()));
    let mut records = ok_records(&sample_keys()[..2]);
    records.push(Err(Error::Listing("connection reset".to_string())));

    let result = engine.analyze(records, "flaky", &SilentReporter).unwrap();

    assert!(matches!(result.termination, Termination::Failed(Error::Listing(_))));
    assert_eq!(result.counters.indexed, 2);
    let stats = read_report(&result.reports, "stats");
    assert!(stats.contains("Listing Status,failed"));
}

#[test]
fn test_engine_compare_writes_missing_and_extra() {
    let out = tempdir().unwrap();
    let engine = ReconcileEngine::new(config_with_output(out.path()));
    let reference = vec![
        Ok(format!("{}/IMG_0001.jpg", UUID_A)),
        Ok(format!("{}/IMG_0003.jpg", UUID_B)),
    ];
    let target = vec![
        Ok(format!(r"D:\Batch1\{}\IMG_0001.jpg", UUID_A.to_lowercase())),
        Ok(format!(r"D:\Batch1\{}\notes.txt", UUID_C)),
    ];

    let result = engine.compare(reference, target, &SilentReporter).unwrap();

    assert_eq!(result.missing, 1);
    assert_eq!(result.extra, 1);
    assert!(!result.partial);
    assert_eq!(
        read_report(&result.reports, "missing"),
        format!("AssetPath\n{}/IMG_0003.jpg\n", UUID_B)
    );
    assert_eq!(
        read_report(&result.reports, "extra"),
        format!("AssetPath\n{}/notes.txt\n", UUID_C)
    );
}

#[test]
fn test_engine_compare_fails_when_a_side_fails() {
    let out = tempdir().unwrap();
    let engine = ReconcileEngine::new(config_with_output(out.path()));
    let reference = vec![Ok(format!("{}/IMG_0001.jpg", UUID_A))];
    let target = vec![Err(Error::Listing("access denied".to_string()))];

    let err = engine.compare(reference, target, &SilentReporter).unwrap_err();
    assert!(matches!(err, Error::Listing(_)));
}
