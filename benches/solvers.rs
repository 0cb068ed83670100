use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use sparsereg::algorithm::{
    Algorithm, BuildAlgorithm, Cholesky, Fista, LineSearch, ProxGrad, Sweep,
};
use sparsereg::{L1Penalty, Model, NoPenalty, Observations, Strategy};
use sparsereg_datasets::generate;

fn observations(nfeatures: usize) -> Observations<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    generate::linear_regression(2000, nfeatures, nfeatures / 4 + 1, 0.1, &mut rng).0
}

fn closed_form_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("closed_form");
    group.sample_size(20);

    for nfeatures in [10, 50, 100].iter() {
        let obs = observations(*nfeatures);

        group.bench_with_input(BenchmarkId::new("sweep", nfeatures), &obs, |b, obs| {
            let mut model = Model::new(obs.nfeatures()).with_penalty(NoPenalty);
            let mut alg = Sweep::new(&model, obs).unwrap();
            b.iter(|| alg.update(black_box(&mut model), obs).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("cholesky", nfeatures), &obs, |b, obs| {
            let mut model = Model::new(obs.nfeatures()).with_penalty(NoPenalty);
            let mut alg = Cholesky::new(&model, obs).unwrap();
            b.iter(|| alg.update(black_box(&mut model), obs).unwrap())
        });
    }

    group.finish();
}

fn lasso_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("lasso");
    group.sample_size(10);

    for nfeatures in [10, 50].iter() {
        let obs = observations(*nfeatures);
        let lasso = |obs: &Observations<f64>| {
            Model::new(obs.nfeatures())
                .with_penalty(L1Penalty)
                .with_uniform_lambda(0.05)
                .unwrap()
        };

        group.bench_with_input(BenchmarkId::new("prox_grad", nfeatures), &obs, |b, obs| {
            b.iter(|| {
                let mut model = lasso(obs);
                let alg = ProxGrad::params().step_size(0.5).build(&model, obs).unwrap();
                Strategy::new(alg)
                    .max_iter(200)
                    .learn(&mut model, obs)
                    .unwrap()
            })
        });
        group.bench_with_input(
            BenchmarkId::new("fista_line_search", nfeatures),
            &obs,
            |b, obs| {
                b.iter(|| {
                    let mut model = lasso(obs);
                    let alg = LineSearch::new(Fista::new(&model, obs).unwrap());
                    Strategy::new(alg)
                        .max_iter(200)
                        .learn(&mut model, obs)
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, closed_form_bench, lasso_bench);
criterion_main!(benches);
