use crate::{Result, StitchError, StitchSettings};
use bitarray::Hamming;
use image::GrayImage;
use imgstitch_core::{Correspondences, FeatureMatch};
use log::*;
use orb::{Descriptor, Orb};
use space::{Knn, LinearKnn, Neighbor};

/// The two nearest neighbors of `query` among `candidates` by Hamming distance, nearest first.
///
/// Returns `None` when there are fewer than two candidates.
pub fn two_nearest(query: &Descriptor, candidates: &[Descriptor]) -> Option<[Neighbor<u32>; 2]> {
    let search = LinearKnn {
        metric: Hamming,
        iter: candidates.iter(),
    };
    match search.knn(query, 2)[..] {
        [nearest, second] => Some([nearest, second]),
        _ => None,
    }
}

/// Pairs every descriptor of `A` with its nearest descriptor of `B` when the nearest is
/// clearly better than the second nearest: `nearest < ratio * second`.
///
/// Returns `(index_a, index_b)` pairs in the order of `descriptors_a`.
pub fn ratio_test_matches(
    descriptors_a: &[Descriptor],
    descriptors_b: &[Descriptor],
    ratio: f64,
) -> Vec<(usize, usize)> {
    descriptors_a
        .iter()
        .enumerate()
        .filter_map(|(ix_a, descriptor)| {
            let [nearest, second] = two_nearest(descriptor, descriptors_b)?;
            ((nearest.distance as f64) < ratio * second.distance as f64)
                .then(|| (ix_a, nearest.index))
        })
        .collect()
}

/// Finds the point correspondences between two grayscale images.
///
/// Fails with [`StitchError::NotEnoughMatchPoints`] when fewer than
/// `settings.minimum_match_points` matches survive the ratio test.
pub fn match_features(
    gray_a: &GrayImage,
    gray_b: &GrayImage,
    settings: &StitchSettings,
) -> Result<Correspondences> {
    let orb = Orb::new(settings.num_keypoints);
    trace!("Extracting features of A.");
    let (keypoints_a, descriptors_a) = orb.extract_gray(gray_a);
    trace!("Extracting features of B.");
    let (keypoints_b, descriptors_b) = orb.extract_gray(gray_b);
    debug!(
        "Running matching on {} and {} descriptors",
        descriptors_a.len(),
        descriptors_b.len()
    );

    let correspondences: Correspondences =
        ratio_test_matches(&descriptors_a, &descriptors_b, settings.ratio)
            .into_iter()
            .map(|(ix_a, ix_b)| FeatureMatch::from_points(&keypoints_a[ix_a], &keypoints_b[ix_b]))
            .collect();
    debug!("Finished matching with {} matches", correspondences.len());

    check_match_count(correspondences.len(), settings.minimum_match_points)?;
    Ok(correspondences)
}

pub(crate) fn check_match_count(found: usize, required: usize) -> Result<()> {
    if found < required {
        warn!(
            "only {} matches between the images, at least {} are required",
            found, required
        );
        return Err(StitchError::NotEnoughMatchPoints { found, required });
    }
    Ok(())
}
