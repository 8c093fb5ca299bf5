//! Random sample consensus.
//!
//! Unlike adaptive variants, this RANSAC decides how many hypotheses it will try before it
//! starts. The count follows from the desired probability `p` of drawing at least one sample
//! made only of inliers, assuming an inlier ratio of one half:
//!
//! ```text
//! iterations = ceil(ln(1 - p) / ln(1 - 0.5^k))
//! ```
//!
//! Each hypothesis is scored by counting outliers over the whole data set. The model with the
//! fewest outliers wins and ties keep the earlier model.

use imgstitch_core::sample_consensus::{Consensus, Estimator, Model};
use log::{debug, trace};
use rand::{seq::index, RngCore};

/// Number of iterations needed to draw one all-inlier sample of size `sample_size` with
/// probability `success_probability` when half of the data are inliers.
///
/// Always at least one.
pub fn iterations(success_probability: f64, sample_size: usize) -> usize {
    let p = success_probability.clamp(0.0, 1.0 - f64::EPSILON);
    let all_inliers = 0.5f64.powi(sample_size as i32);
    let n = ((1.0 - p).ln() / (1.0 - all_inliers).ln()).ceil();
    if n.is_finite() && n >= 1.0 {
        n as usize
    } else {
        1
    }
}

/// What a RANSAC run found.
#[derive(Debug, Clone, PartialEq)]
pub struct RansacOutcome<M> {
    /// The best model, if any sample produced one.
    pub model: Option<M>,
    /// Outliers of the best model, or `total` if there is no model.
    pub outliers: usize,
    /// Size of the data set.
    pub total: usize,
}

impl<M> RansacOutcome<M> {
    pub fn inliers(&self) -> usize {
        self.total - self.outliers
    }
}

#[derive(Debug, Clone)]
pub struct Ransac<R> {
    /// Number of data drawn per hypothesis. Raised to the estimator's minimum if lower.
    pub sample_size: usize,
    /// Probability of drawing at least one sample free of outliers.
    pub success_probability: f64,
    /// A datum whose residual exceeds this is an outlier.
    pub outlier_threshold: f64,
    rng: R,
}

impl<R> Ransac<R>
where
    R: RngCore,
{
    /// Creates a RANSAC with a sample size of `5` and a success probability of `0.995`.
    pub fn new(outlier_threshold: f64, rng: R) -> Self {
        Self {
            sample_size: 5,
            success_probability: 0.995,
            outlier_threshold,
            rng,
        }
    }

    pub fn sample_size(self, sample_size: usize) -> Self {
        Self {
            sample_size,
            ..self
        }
    }

    pub fn success_probability(self, success_probability: f64) -> Self {
        Self {
            success_probability,
            ..self
        }
    }

    /// Number of hypotheses a run with this estimator will try.
    pub fn iterations<E, Data>(&self) -> usize
    where
        E: Estimator<Data>,
    {
        iterations(self.success_probability, self.effective_sample_size::<E, Data>())
    }

    fn effective_sample_size<E, Data>(&self) -> usize
    where
        E: Estimator<Data>,
    {
        self.sample_size.max(E::MIN_SAMPLES)
    }

    fn count_outliers<M, Data>(&self, model: &M, data: &[Data]) -> usize
    where
        M: Model<Data>,
    {
        // NaN residuals count as outliers.
        data.iter()
            .filter(|datum| !(model.residual(datum) <= self.outlier_threshold))
            .count()
    }

    /// Runs the full iteration budget and reports the best model with its outlier count.
    pub fn estimate<E, Data, I>(&mut self, estimator: &E, data: I) -> RansacOutcome<E::Model>
    where
        E: Estimator<Data>,
        Data: Clone,
        I: Iterator<Item = Data>,
    {
        let data: Vec<Data> = data.collect();
        let total = data.len();
        let sample_size = self.effective_sample_size::<E, Data>();
        let mut outcome = RansacOutcome {
            model: None,
            outliers: total,
            total,
        };
        if total < sample_size {
            debug!(
                "only {} data, need at least {} to sample a hypothesis",
                total, sample_size
            );
            return outcome;
        }

        let iterations = iterations(self.success_probability, sample_size);
        debug!(
            "running {} iterations with samples of {} over {} data",
            iterations, sample_size, total
        );
        for iteration in 0..iterations {
            let sample = index::sample(&mut self.rng, total, sample_size).into_vec();
            let models = estimator.estimate(sample.iter().map(|&ix| data[ix].clone()));
            for model in models {
                let outliers = self.count_outliers(&model, &data);
                if outcome.model.is_none() || outliers < outcome.outliers {
                    trace!(
                        "iteration {} improved the model to {} outliers",
                        iteration,
                        outliers
                    );
                    outcome.model = Some(model);
                    outcome.outliers = outliers;
                }
            }
        }
        debug!(
            "best model has {} outliers out of {}",
            outcome.outliers, outcome.total
        );
        outcome
    }
}

impl<E, R, Data> Consensus<E, Data> for Ransac<R>
where
    E: Estimator<Data>,
    R: RngCore,
    Data: Clone,
{
    type Inliers = Vec<usize>;

    fn model<I>(&mut self, estimator: &E, data: I) -> Option<E::Model>
    where
        I: Iterator<Item = Data> + Clone,
    {
        self.estimate(estimator, data).model
    }

    fn model_inliers<I>(&mut self, estimator: &E, data: I) -> Option<(E::Model, Self::Inliers)>
    where
        I: Iterator<Item = Data> + Clone,
    {
        let model = self.estimate(estimator, data.clone()).model?;
        let inliers = data
            .enumerate()
            .filter(|(_, datum)| model.residual(datum) <= self.outlier_threshold)
            .map(|(ix, _)| ix)
            .collect();
        Some((model, inliers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::mock::StepRng, SeedableRng};
    use rand_pcg::Pcg64;

    /// A one dimensional "model": the mean of the sample.
    struct Mean;

    struct Level(f64);

    impl Model<f64> for Level {
        fn residual(&self, data: &f64) -> f64 {
            (data - self.0).abs()
        }
    }

    impl Estimator<f64> for Mean {
        type Model = Level;
        type ModelIter = Option<Level>;
        const MIN_SAMPLES: usize = 1;

        fn estimate<I>(&self, data: I) -> Self::ModelIter
        where
            I: Iterator<Item = f64> + Clone,
        {
            let count = data.clone().count();
            Some(Level(data.sum::<f64>() / count as f64))
        }
    }

    #[test]
    fn iteration_count() {
        assert_eq!(iterations(0.995, 5), 167);
        assert_eq!(iterations(0.99, 4), 72);
        assert_eq!(iterations(0.0, 5), 1);
        assert!(iterations(1.0, 5) > 167);
    }

    #[test]
    fn too_little_data_yields_no_model() {
        let mut ransac = Ransac::new(1.0, Pcg64::seed_from_u64(0));
        let outcome = ransac.estimate(&Mean, [1.0, 2.0, 3.0].iter().copied());
        assert!(outcome.model.is_none());
        assert_eq!(outcome.outliers, 3);
        assert_eq!(outcome.total, 3);
    }

    #[test]
    fn single_samples_find_the_cluster() {
        let data = [0.0, 0.1, -0.1, 0.05, 40.0, -25.0];
        let mut ransac = Ransac::new(0.5, Pcg64::seed_from_u64(0)).sample_size(1);
        let (model, inliers) = ransac.model_inliers(&Mean, data.iter().copied()).unwrap();
        assert!(model.0.abs() <= 0.1);
        assert_eq!(inliers, vec![0, 1, 2, 3]);
    }

    #[test]
    fn constant_rng_still_terminates() {
        let data = [1.0; 10];
        let mut ransac = Ransac::new(0.5, StepRng::new(0, 0));
        let outcome = ransac.estimate(&Mean, data.iter().copied());
        assert_eq!(outcome.outliers, 0);
        assert_eq!(outcome.inliers(), 10);
    }
}
