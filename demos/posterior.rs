//! Score candidate means against a few simulated observations.

use anyhow::Result;
use measure_for::{Density, Likelihood, LogLikelihood, Measure, Normal};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> Result<()> {
    let truth = Normal::new(1.5, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let data = (0..5)
        .map(|_| truth.sample(&mut rng))
        .collect::<measure_for::Result<Vec<_>>>()?;

    let likelihoods = data
        .iter()
        .map(|&x| Likelihood::<Normal>::constrained([("sigma", 1.0)], x))
        .collect::<measure_for::Result<Vec<_>>>()?;

    let prior = Normal::standard();
    println!("{}", prior.pointwise(&likelihoods[0]));

    for mu in [-0.5, 0.0, 0.5, 1.0, 1.5, 2.0, 2.5] {
        let mut lp = prior.logdensity(&mu)?;
        for l in &likelihoods {
            lp += l.loglikelihood(&mu)?;
        }
        println!("mu = {:>4}: log posterior {:.4}", mu, lp);
    }
    Ok(())
}
