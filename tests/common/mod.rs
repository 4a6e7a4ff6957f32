#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use heartflow::pipeline::PipelineContext;
use heartflow::preprocess::FeatureSchema;
use heartflow::target::{DirectoryObjectStore, MemoryObjectStore, ObjectStore};

pub use heartflow_test_utils::{init_tracing, with_timeout};

/// Synthetic heart dataset with the 14 source columns.
///
/// - `cp`, `exang`, `thal` and `thalach` depend on the label.
/// - `trestbps` is almost a linear function of `age`, so the pair is collinear.
/// - `ca` is occasionally 4 and `thal` occasionally 0 (out-of-range values).
pub fn synthetic_heart_csv(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = FeatureSchema::source_columns().join(",");
    out.push('\n');

    for _ in 0..rows {
        let target: u8 = rng.gen_range(0..=1);
        let age: i64 = rng.gen_range(35..=75);
        let trestbps = 2 * age + rng.gen_range(-2..=2);
        let sex: u8 = rng.gen_range(0..=1);
        let cp: u8 = if target == 1 {
            rng.gen_range(1..=3)
        } else {
            rng.gen_range(0..=1)
        };
        let chol: i64 = rng.gen_range(170..=320);
        let fbs: u8 = rng.gen_range(0..=1);
        let restecg: u8 = rng.gen_range(0..=2);
        let thalach: i64 = if target == 1 {
            rng.gen_range(160..=200)
        } else {
            rng.gen_range(90..=130)
        };
        let exang: u8 = if rng.gen_bool(0.8) { 1 - target } else { target };
        let oldpeak = f64::from(rng.gen_range(0..=40u8)) / 10.0;
        let slope: u8 = rng.gen_range(0..=2);
        let ca: u8 = if rng.gen_bool(0.05) { 4 } else { rng.gen_range(0..=3) };
        let thal: u8 = if rng.gen_bool(0.05) {
            0
        } else if target == 1 {
            2
        } else {
            rng.gen_range(1..=3)
        };

        out.push_str(&format!(
            "{age},{sex},{cp},{trestbps},{chol},{fbs},{restecg},{thalach},{exang},{oldpeak:.1},{slope},{ca},{thal},{target}\n"
        ));
    }
    out
}

/// Write `csv` as `<data_dir>/heart.csv`.
pub fn seed_local_dataset(data_dir: &Path, csv: &str) {
    std::fs::create_dir_all(data_dir).unwrap();
    std::fs::write(data_dir.join("heart.csv"), csv).unwrap();
}

/// Pipeline context over `data_dir` with an in-memory object store.
pub fn memory_context(data_dir: &Path) -> (Arc<PipelineContext>, MemoryObjectStore) {
    let store = MemoryObjectStore::new();
    let ctx = PipelineContext::new(data_dir, "s3://heartflow-test", Arc::new(store.clone()));
    (Arc::new(ctx), store)
}

/// Pipeline context over `data_dir` with a directory-backed object store.
pub fn directory_context(data_dir: &Path, remote_dir: &Path) -> Arc<PipelineContext> {
    let store: Arc<dyn ObjectStore> = Arc::new(DirectoryObjectStore::new(remote_dir));
    Arc::new(PipelineContext::new(data_dir, "s3://heartflow-test", store))
}
