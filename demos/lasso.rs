use std::time::Duration;

use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use sparsereg::algorithm::{Algorithm, Cholesky, Fista, LineSearch};
use sparsereg::{L1Penalty, Model, NoPenalty, Strategy, Tracer};
use sparsereg_datasets::generate;

fn main() -> sparsereg::Result<()> {
    // 1000 observations of 20 features, only the first 4 carry signal
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let (obs, truth) = generate::linear_regression(1000, 20, 4, 0.5, &mut rng);

    let mut lasso = Model::new(20)
        .with_penalty(L1Penalty)
        .with_uniform_lambda(0.1)?;
    let mut tracer = Tracer::new(10, |model: &Model<f64>| model.objective(&obs));

    let learned = Strategy::new(LineSearch::new(Fista::new(&lasso, &obs)?))
        .max_iter(2000)
        .time_limit(Duration::from_secs(5))
        .converged(1e-8)
        .hook(&mut tracer)
        .learn(&mut lasso, &obs)?;

    println!(
        "lasso finished with {:?} after {} iterations in {:?}",
        learned.status, learned.iterations, learned.elapsed
    );
    for (iteration, objective) in tracer.values().iter().take(5) {
        println!("  iteration {:>4}: objective {:.6}", iteration, objective);
    }

    let mut least_squares = Model::new(20).with_penalty(NoPenalty);
    Cholesky::new(&least_squares, &obs)?.update(&mut least_squares, &obs)?;

    println!("{:>8} {:>10} {:>10} {:>10}", "feature", "truth", "lasso", "ols");
    for j in 0..20 {
        println!(
            "{:>8} {:>10.4} {:>10.4} {:>10.4}",
            j,
            truth[j],
            lasso.coef()[j],
            least_squares.coef()[j]
        );
    }

    let selected = lasso.coef().iter().filter(|c| **c != 0.).count();
    println!("lasso selected {} of 20 features", selected);

    Ok(())
}
