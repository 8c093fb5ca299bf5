use crate::matching::check_match_count;
use crate::{Result, StitchError, StitchSettings};
use four_point::FourPoint;
use imgstitch_core::{sample_consensus::Model, Correspondences, FeatureMatch, Homography};
use log::*;
use rand::RngCore;
use ransac::Ransac;

/// Percentage of inliers, truncated toward zero.
///
/// An empty set has no confidence.
pub fn confidence(outliers: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    (100.0 - (100 * outliers) as f64 / total as f64) as i32
}

/// Upper bound on inlier refits after RANSAC.
const REFIT_ROUNDS: usize = 3;

fn is_inlier(homography: &Homography, correspondence: &FeatureMatch, threshold: f64) -> bool {
    homography.residual(correspondence) <= threshold
}

fn count_outliers(
    homography: &Homography,
    correspondences: &Correspondences,
    threshold: f64,
) -> usize {
    correspondences
        .iter()
        .filter(|m| !is_inlier(homography, m, threshold))
        .count()
}

/// Refits `homography` on all of its inliers with the least squares DLT.
///
/// A minimal sample only constrains the homography near the sampled points, so its error grows
/// quickly away from them. The refit uses every inlier instead. It repeats while the outlier
/// count does not grow and stops after [`REFIT_ROUNDS`]. Returns the refined homography with
/// its outlier count.
pub fn refit_inliers(
    homography: Homography,
    outliers: usize,
    correspondences: &Correspondences,
    threshold: f64,
) -> (Homography, usize) {
    let estimator = FourPoint::new();
    let mut best = (homography, outliers);
    for round in 0..REFIT_ROUNDS {
        let inliers: Vec<FeatureMatch> = correspondences
            .iter()
            .filter(|m| is_inlier(&best.0, m, threshold))
            .collect();
        let refit = match estimator.from_matches(inliers.iter().copied()) {
            Some(refit) => refit,
            None => break,
        };
        let refit_outliers = count_outliers(&refit, correspondences, threshold);
        if refit_outliers > best.1 {
            debug!(
                "refit {} raised outliers from {} to {}, keeping the previous model",
                round, best.1, refit_outliers
            );
            break;
        }
        trace!("refit {} on {} inliers has {} outliers", round, inliers.len(), refit_outliers);
        let converged = refit_outliers == best.1 && refit == best.0;
        best = (refit, refit_outliers);
        if converged {
            break;
        }
    }
    best
}

/// A homography that passed the confidence check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Maps points of `B` into the frame of `A`.
    pub homography: Homography,
    /// Percentage of correspondences the homography explains.
    pub confidence: i32,
    pub outliers: usize,
}

/// Fits a homography to the correspondences with RANSAC over the direct linear transform,
/// then refits the winner on all of its inliers with [`refit_inliers`].
///
/// Fails with [`StitchError::NotEnoughMatchPoints`] when the set is smaller than
/// `settings.minimum_match_points` and with [`StitchError::MatchesNotConfident`] when the best
/// refit model explains less than `settings.confidence_threshold` percent of the set. When no
/// sample yields a model at all the confidence is `0`.
pub fn estimate_homography<R>(
    correspondences: &Correspondences,
    settings: &StitchSettings,
    rng: R,
) -> Result<Estimate>
where
    R: RngCore,
{
    check_match_count(correspondences.len(), settings.minimum_match_points)?;

    let mut ransac = Ransac::new(settings.outlier_threshold, rng)
        .sample_size(settings.sample_size)
        .success_probability(settings.success_probability);
    let outcome = ransac.estimate(&FourPoint::new(), correspondences.iter());
    let total = outcome.total;
    let refined = outcome.model.map(|homography| {
        refit_inliers(
            homography,
            outcome.outliers,
            correspondences,
            settings.outlier_threshold,
        )
    });
    let confidence = refined
        .as_ref()
        .map_or(0, |&(_, outliers)| confidence(outliers, total));
    if let Some((_, outliers)) = refined {
        info!(
            "Best homography has {} outliers in {} matches, confidence {}",
            outliers, total, confidence
        );
    }

    match refined {
        Some((homography, outliers)) if confidence >= settings.confidence_threshold => {
            Ok(Estimate {
                homography,
                confidence,
                outliers,
            })
        }
        _ => {
            warn!(
                "confidence {} is below the threshold of {}",
                confidence, settings.confidence_threshold
            );
            Err(StitchError::MatchesNotConfident { confidence })
        }
    }
}
