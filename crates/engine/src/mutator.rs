//! Stochastic perturbation of a parameter vector.

use evotune_core::ParamVector;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Produce a perturbed copy of `values`.
///
/// Parameter names are shuffled into a uniformly random order and zipped
/// positionally with `rates`, so a given rate can land on a different
/// parameter on every call. The k-th name with paired rate `r` is scaled by
/// a relative delta drawn uniformly from `[-r, r)`:
///
/// ```text
/// new = old + old * r * 2 * (u - 0.5),  u ~ U[0, 1)
/// ```
///
/// Names beyond the end of `rates` get rate 0 and are copied unchanged.
/// The output always carries exactly the input's key set.
pub fn mutate<R: Rng + ?Sized>(values: &ParamVector, rates: &[f64], rng: &mut R) -> ParamVector {
    let mut names: Vec<&str> = values.keys().map(String::as_str).collect();
    names.shuffle(rng);

    let mut mutated = ParamVector::new();
    for (position, name) in names.into_iter().enumerate() {
        let rate = rates.get(position).copied().unwrap_or(0.0);
        let value = values[name];
        let delta = rate * 2.0 * (rng.gen::<f64>() - 0.5);
        let new_value = value + value * delta;
        if delta != 0.0 {
            debug!("mutating {} with delta={}: {} -> {}", name, delta, value, new_value);
        }
        mutated.insert(name.to_string(), new_value);
    }
    mutated
}
