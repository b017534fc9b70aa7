//! Tests for table files, the table cache and the angle provider.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ballista_core::constants::FALLBACK_ANGLE;
use ballista_core::error::BallisticsError;
use ballista_core::profile::{BarrelGeometry, SpeedRange, WorldProfile};
use ballista_core::table::FiringTable;
use ballista_core::GridCell;
use ballista_sim::solver::AngleSolver;

use crate::cache::TableCache;
use crate::format;
use crate::provider::AngleProvider;
use crate::source::{DirTableSource, MemoryTableSource, TableSource};

fn sample_table() -> FiringTable {
    let mut table = FiringTable::new();
    table.insert(GridCell::new(100, -20), 40);
    table.insert(GridCell::new(100, -20), 10);
    table.insert(GridCell::new(100, 20), 50);
    table.insert(GridCell::new(-10, 30), 170);
    table
}

fn radians(degrees: &[u16]) -> Vec<f64> {
    degrees.iter().map(|&d| f64::from(d).to_radians()).collect()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "ballista_tables_{name}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Memory source that counts loads, sleeps, and can fail the first loads.
struct CountingSource {
    inner: MemoryTableSource,
    loads: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingSource {
    fn new(inner: MemoryTableSource, failures: usize) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            delay: Duration::from_millis(20),
        }
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableSource for CountingSource {
    async fn load(&self, world_id: &str) -> Result<Option<FiringTable>, BallisticsError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BallisticsError::TableLoad {
                world: world_id.to_string(),
                reason: "simulated read failure".into(),
            });
        }
        self.inner.load(world_id).await
    }
}

// ---- File format ----

#[test]
fn test_format_canonical_json() {
    let json = format::to_json(&sample_table()).unwrap();
    assert_eq!(json, r#"{"-10":{"30":[170]},"100":{"-20":[10,40],"20":[50]}}"#);
    assert_eq!(format::parse(&json).unwrap(), sample_table());
}

#[test]
fn test_format_accepts_unordered_keys() {
    let table = format::parse(r#"{"100":{"20":[50],"-20":[10,40]},"-10":{"30":[170]}}"#).unwrap();
    assert_eq!(table, sample_table());
}

#[test]
fn test_format_rejects_malformed_tables() {
    let cases = [
        ("[1, 2, 3]", "not an object"),
        (r#"{"abc":{"10":[5]}}"#, "non-integer x"),
        (r#"{"10":{"1.5":[5]}}"#, "non-integer y"),
        (r#"{"15":{"10":[5]}}"#, "unaligned x"),
        (r#"{"10":{"-25":[5]}}"#, "unaligned y"),
        (r#"{"10":{"10":[360]}}"#, "angle past 359"),
        (r#"{"10":{"10":[-5]}}"#, "negative angle"),
        (r#"{"10":{"10":[40,10]}}"#, "unsorted"),
        (r#"{"10":{"10":[10,10]}}"#, "duplicate"),
        (r#"{"10":{"10":[1.5]}}"#, "fractional angle"),
    ];
    for (json, label) in cases {
        let result = format::parse(json);
        assert!(
            matches!(result, Err(BallisticsError::TableFormat(_))),
            "{label} should be rejected, got {result:?}"
        );
    }
}

#[test]
fn test_format_file_names() {
    assert_eq!(format::file_name("desert-02").unwrap(), "desert-02.json");
    for bad in ["", ".", "..", "../escape", "a/b", "a\\b"] {
        assert!(format::file_name(bad).is_err(), "'{bad}' should be rejected");
    }
}

#[test]
fn test_format_write_and_load_file() {
    let dir = temp_dir("write_load");
    let path = format::table_path(&dir.join("nested"), "valley").unwrap();

    format::write(&sample_table(), &path).unwrap();
    assert!(path.ends_with("valley.json"));
    assert_eq!(format::load(&path).unwrap(), sample_table());

    let _ = std::fs::remove_dir_all(&dir);
}

// ---- Cache ----

#[tokio::test]
async fn test_cache_lookup_snaps_target() {
    let source = MemoryTableSource::new().with_table("valley", sample_table());
    let cache = TableCache::new(Arc::new(source));

    assert_eq!(
        cache.lookup("valley", DVec2::new(104.0, -16.0)).await,
        radians(&[10, 40])
    );
    assert_eq!(
        cache.lookup("valley", DVec2::new(-12.0, 34.9)).await,
        radians(&[170])
    );
    assert!(cache.lookup("valley", DVec2::new(500.0, 500.0)).await.is_empty());
}

#[tokio::test]
async fn test_cache_lookup_is_idempotent() {
    let source = MemoryTableSource::new().with_table("valley", sample_table());
    let cache = TableCache::new(Arc::new(source));
    let target = DVec2::new(100.0, -20.0);

    let first = cache.lookup("valley", target).await;
    for _ in 0..5 {
        let again = cache.lookup("valley", target).await;
        let bits = |v: &[f64]| v.iter().map(|a| a.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&again));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cache_single_load_under_concurrency() {
    let source = Arc::new(CountingSource::new(
        MemoryTableSource::new().with_table("valley", sample_table()),
        0,
    ));
    let cache = Arc::new(TableCache::new(source.clone()));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.lookup("valley", DVec2::new(100.0, 20.0)).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), radians(&[50]));
    }
    assert_eq!(source.loads(), 1, "Concurrent lookups should share one load");
    assert!(cache.is_loaded("valley"));
}

#[tokio::test]
async fn test_cache_failed_load_not_cached() {
    let source = Arc::new(CountingSource::new(
        MemoryTableSource::new().with_table("valley", sample_table()),
        1,
    ));
    let cache = TableCache::new(source.clone());
    let target = DVec2::new(100.0, 20.0);

    assert!(cache.lookup("valley", target).await.is_empty());
    assert!(!cache.is_loaded("valley"));
    assert_eq!(cache.lookup_ready("valley", target), None);

    assert_eq!(cache.lookup("valley", target).await, radians(&[50]));
    assert_eq!(source.loads(), 2);
    assert!(cache.is_loaded("valley"));

    cache.lookup("valley", target).await;
    assert_eq!(source.loads(), 2);
}

#[tokio::test]
async fn test_cache_missing_world_is_remembered() {
    let source = Arc::new(CountingSource::new(MemoryTableSource::new(), 0));
    let cache = TableCache::new(source.clone());

    assert!(cache.lookup("nowhere", DVec2::ZERO).await.is_empty());
    assert!(cache.is_loaded("nowhere"));
    assert!(!cache.preload("nowhere").await.unwrap());
    assert_eq!(cache.lookup_ready("nowhere", DVec2::ZERO), Some(Vec::new()));
    assert_eq!(source.loads(), 1);
}

#[tokio::test]
async fn test_cache_ready_lookup_never_waits() {
    let source = MemoryTableSource::new().with_table("valley", sample_table());
    let cache = TableCache::new(Arc::new(source));
    let target = DVec2::new(100.0, 20.0);

    assert_eq!(cache.lookup_ready("valley", target), None);
    assert!(!cache.is_loaded("valley"));

    assert!(cache.preload("valley").await.unwrap());
    assert_eq!(cache.lookup_ready("valley", target), Some(radians(&[50])));
    assert_eq!(
        cache.lookup_ready("valley", DVec2::new(900.0, 900.0)),
        Some(Vec::new())
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cache_ready_lookup_is_none_while_loading() {
    let source = Arc::new(CountingSource::new(
        MemoryTableSource::new().with_table("valley", sample_table()),
        0,
    ));
    let cache = Arc::new(TableCache::new(source.clone()));
    let target = DVec2::new(100.0, 20.0);

    let pending = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.lookup("valley", target).await })
    };
    while source.loads() == 0 {
        tokio::task::yield_now().await;
    }

    // The load is sleeping inside the source.
    assert_eq!(cache.lookup_ready("valley", target), None);
    assert!(!cache.is_loaded("valley"));

    assert_eq!(pending.await.unwrap(), radians(&[50]));
    assert_eq!(cache.lookup_ready("valley", target), Some(radians(&[50])));
    assert_eq!(source.loads(), 1);
}

#[tokio::test]
async fn test_cache_invalidate_reloads() {
    let source = Arc::new(CountingSource::new(
        MemoryTableSource::new().with_table("valley", sample_table()),
        0,
    ));
    let cache = TableCache::new(source.clone());

    cache.preload("valley").await.unwrap();
    cache.invalidate("valley");
    assert!(!cache.is_loaded("valley"));
    cache.preload("valley").await.unwrap();
    assert_eq!(source.loads(), 2);
}

#[tokio::test]
async fn test_dir_source_recovers_after_corrupt_file() {
    let dir = temp_dir("corrupt");
    let path = format::table_path(&dir, "valley").unwrap();
    std::fs::write(&path, "{\"100\": {\"20\": [50,").unwrap();

    let cache = TableCache::from_dir(&dir);
    let target = DVec2::new(100.0, 20.0);

    assert!(cache.lookup("valley", target).await.is_empty());
    assert!(!cache.is_loaded("valley"));

    format::write(&sample_table(), &path).unwrap();
    assert_eq!(cache.lookup("valley", target).await, radians(&[50]));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_dir_source_reports_load_errors() {
    let dir = temp_dir("errors");
    let source = DirTableSource::new(&dir);

    assert!(source.load("absent").await.unwrap().is_none());

    std::fs::write(dir.join("broken.json"), r#"{"15":{"10":[5]}}"#).unwrap();
    let result = source.load("broken").await;
    assert!(matches!(result, Err(BallisticsError::TableLoad { .. })));

    assert!(source.load("../outside").await.is_err());

    let _ = std::fs::remove_dir_all(&dir);
}

// ---- Angle provider ----

fn open_field() -> WorldProfile {
    WorldProfile {
        id: "valley".into(),
        gravity: 900.0,
        drag: 0.01,
        speed_range: SpeedRange {
            min: 300.0,
            max: 600.0,
        },
        barrel: BarrelGeometry {
            pivot: DVec2::ZERO,
            length: 0.0,
        },
        projectile_radius: 8.0,
    }
}

#[tokio::test]
async fn test_provider_live_solve() {
    let world = open_field();
    let provider = AngleProvider::live(&world);
    let target = DVec2::new(400.0, -50.0);

    let angles = provider.angles(target).await;
    assert!((1..=2).contains(&angles.len()));

    let solver = AngleSolver::new(&world);
    for &angle in &angles {
        assert!(solver.hits(angle, target, 600.0));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_provider_live_solves_run_concurrently() {
    let provider = Arc::new(AngleProvider::live(&open_field()));
    let target = DVec2::new(300.0, 0.0);
    let expected = provider.angles(target).await;
    assert!(!expected.is_empty());

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move { provider.angles(target).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_provider_aim_is_reproducible() {
    let provider = AngleProvider::live(&open_field());
    let target = DVec2::new(300.0, 0.0);
    let angles = provider.angles(target).await;

    let mut rng_a = ChaCha8Rng::seed_from_u64(42);
    let mut rng_b = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..5 {
        let a = provider.aim(target, &mut rng_a).await;
        let b = provider.aim(target, &mut rng_b).await;
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(angles.contains(&a));
    }
}

#[tokio::test]
async fn test_provider_falls_back_to_default_angle() {
    let provider = AngleProvider::live(&open_field());
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert_eq!(provider.aim(DVec2::new(-100.0, 0.0), &mut rng).await, FALLBACK_ANGLE);
    assert_eq!(provider.aim(DVec2::new(5000.0, 0.0), &mut rng).await, FALLBACK_ANGLE);
}

#[tokio::test]
async fn test_provider_table_lookup_then_live_fallback() {
    let world = open_field();
    let mut table = FiringTable::new();
    table.insert(GridCell::new(400, -50), 30);
    let cache = Arc::new(TableCache::new(Arc::new(
        MemoryTableSource::new().with_table("valley", table),
    )));
    let provider = AngleProvider::table(&world, cache);

    assert_eq!(provider.angles(DVec2::new(402.0, -48.0)).await, radians(&[30]));

    let target = DVec2::new(200.0, 0.0);
    let live = provider.angles(target).await;
    assert!(!live.is_empty(), "Uncovered cells should be solved live");
    let solver = AngleSolver::new(&world);
    assert!(live.iter().all(|&a| solver.hits(a, target, 600.0)));

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    assert_eq!(
        provider.aim(DVec2::new(400.0, -50.0), &mut rng).await,
        30f64.to_radians()
    );
}
