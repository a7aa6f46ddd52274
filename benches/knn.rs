use checkin_knn::optimizer::{GridSearchCV, GridSearchConfig, ParamGrid};
use checkin_knn::training::{Classifier, Estimator, KNNClassifier};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_checkin_like_data(n_rows: usize, n_places: i64) -> (Array2<f64>, Vec<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let labels: Vec<i64> = (0..n_rows).map(|_| rng.gen_range(0..n_places)).collect();

    let x = Array2::from_shape_fn((n_rows, 6), |(i, j)| {
        let center = (labels[i] as f64 * 0.37 + j as f64) % 10.0;
        center + rng.gen::<f64>() * 0.5
    });
    (x, labels)
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");

    for n_rows in [1000, 5000, 20000].iter() {
        let (x, y) = create_checkin_like_data(*n_rows, 50);
        let fitted = KNNClassifier::with_k(5).fit(&x, &y).unwrap();
        let (queries, _) = create_checkin_like_data(200, 50);

        group.bench_with_input(BenchmarkId::new("k5", n_rows), &queries, |b, q| {
            b.iter(|| fitted.predict(black_box(q)).unwrap())
        });
    }

    group.finish();
}

fn bench_grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    group.sample_size(10);

    let (x, y) = create_checkin_like_data(2000, 20);
    let grid = ParamGrid::new()
        .with_param("n_neighbors", [3, 5, 10])
        .with_param("weights", ["uniform", "distance"]);

    for n_jobs in [1usize, 0].iter() {
        let search = GridSearchCV::new(GridSearchConfig::default().with_cv_folds(3).with_n_jobs(*n_jobs));

        group.bench_with_input(BenchmarkId::new("n_jobs", n_jobs), &grid, |b, grid| {
            b.iter(|| {
                search
                    .search(KNNClassifier::from_params, black_box(grid), &x, &y)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_predict, bench_grid_search);
criterion_main!(benches);
