//! Defective pixel location selection.
//!
//! Hot and dead locations are drawn uniformly without replacement from the
//! flattened pixel index space; dead locations come from the complement of
//! the hot set, so the two classes never overlap. Flat indices convert back
//! to `(row, col)` with row-major unraveling.

use rand::seq::{index, IndexedRandom};
use rand::Rng;
use shared::ImageSize;
use std::collections::HashSet;

use super::DefectError;

/// Disjoint hot and dead pixel coordinate sets, as `(row, col)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadPixelLocations {
    /// Bright stuck pixels
    pub hot: Vec<(usize, usize)>,
    /// Dark stuck pixels
    pub dead: Vec<(usize, usize)>,
}

/// Number of defective pixels for a percentage of the total, truncated
fn defect_count(total_pixels: usize, percentage: f64) -> usize {
    (total_pixels as f64 * (percentage / 100.0)) as usize
}

fn validate_percentage(percentage: f64) -> Result<(), DefectError> {
    if !(0.0..=100.0).contains(&percentage) {
        return Err(DefectError::InvalidPercentage(percentage));
    }
    Ok(())
}

/// Select disjoint hot and dead pixel locations for a sensor grid.
///
/// Set sizes are `floor(total_pixels * percentage / 100)`. Hot locations are
/// sampled uniformly without replacement from the flat index space; dead
/// locations are sampled without replacement from the remaining indices.
///
/// # Arguments
/// * `size` - Sensor grid dimensions
/// * `hot_percentage` - Percentage of pixels to mark hot, in [0, 100]
/// * `dead_percentage` - Percentage of pixels to mark dead, in [0, 100]
/// * `rng` - Random number generator
///
/// # Errors
/// [`DefectError::InvalidPercentage`] for a percentage outside [0, 100];
/// [`DefectError::InsufficientPixels`] when the combined counts exceed the
/// grid.
pub fn select_bad_pixel_locations(
    size: ImageSize,
    hot_percentage: f64,
    dead_percentage: f64,
    rng: &mut impl Rng,
) -> Result<BadPixelLocations, DefectError> {
    validate_percentage(hot_percentage)?;
    validate_percentage(dead_percentage)?;

    let total_pixels = size.pixel_count();
    let num_hot = defect_count(total_pixels, hot_percentage);
    let num_dead = defect_count(total_pixels, dead_percentage);

    if num_hot + num_dead > total_pixels {
        return Err(DefectError::InsufficientPixels {
            requested: num_hot + num_dead,
            available: total_pixels,
        });
    }

    let hot_flat: Vec<usize> = index::sample(rng, total_pixels, num_hot).into_vec();

    // Dead pixels come from the complement of the hot set
    let taken: HashSet<usize> = hot_flat.iter().copied().collect();
    let remaining: Vec<usize> = (0..total_pixels).filter(|i| !taken.contains(i)).collect();
    let dead_flat: Vec<usize> = remaining
        .choose_multiple(rng, num_dead)
        .copied()
        .collect();

    Ok(BadPixelLocations {
        hot: hot_flat.iter().map(|&flat| size.unravel(flat)).collect(),
        dead: dead_flat.iter().map(|&flat| size.unravel(flat)).collect(),
    })
}

/// Select telegraphic pixel locations: one undivided coordinate set covering
/// `telegraphic_percentage` of the grid, drawn without replacement.
pub fn select_telegraphic_locations(
    size: ImageSize,
    telegraphic_percentage: f64,
    rng: &mut impl Rng,
) -> Result<Vec<(usize, usize)>, DefectError> {
    validate_percentage(telegraphic_percentage)?;

    let total_pixels = size.pixel_count();
    let count = defect_count(total_pixels, telegraphic_percentage);

    Ok(index::sample(rng, total_pixels, count)
        .into_vec()
        .iter()
        .map(|&flat| size.unravel(flat))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn coordinate_set(coords: &[(usize, usize)]) -> HashSet<(usize, usize)> {
        coords.iter().copied().collect()
    }

    #[test]
    fn test_counts_and_disjointness() {
        let size = ImageSize::from_width_height(32, 24);
        let total = size.pixel_count();
        let mut rng = StdRng::seed_from_u64(42);

        let locations = select_bad_pixel_locations(size, 3.0, 7.0, &mut rng).unwrap();

        assert_eq!(locations.hot.len(), (total as f64 * 0.03) as usize);
        assert_eq!(locations.dead.len(), (total as f64 * 0.07) as usize);

        let hot = coordinate_set(&locations.hot);
        let dead = coordinate_set(&locations.dead);
        assert_eq!(hot.len(), locations.hot.len(), "hot set has duplicates");
        assert_eq!(dead.len(), locations.dead.len(), "dead set has duplicates");
        assert!(hot.is_disjoint(&dead));
    }

    #[test]
    fn test_4x4_grid_quarter_hot() {
        let size = ImageSize::from_width_height(4, 4);
        let mut rng = StdRng::seed_from_u64(1);

        let locations = select_bad_pixel_locations(size, 25.0, 0.0, &mut rng).unwrap();
        assert_eq!(locations.hot.len(), 4);
        assert!(locations.dead.is_empty());

        // All remaining 12 pixels stay eligible for dead selection
        let hot = coordinate_set(&locations.hot);
        let eligible = (0..size.pixel_count())
            .map(|flat| size.unravel(flat))
            .filter(|coord| !hot.contains(coord))
            .count();
        assert_eq!(eligible, 12);
    }

    #[test]
    fn test_zero_percentage_empty_sets() {
        let size = ImageSize::from_width_height(10, 10);
        let mut rng = StdRng::seed_from_u64(9);

        let locations = select_bad_pixel_locations(size, 0.0, 0.0, &mut rng).unwrap();
        assert!(locations.hot.is_empty());
        assert!(locations.dead.is_empty());
    }

    #[test]
    fn test_full_grid_allocation() {
        let size = ImageSize::from_width_height(8, 8);
        let mut rng = StdRng::seed_from_u64(2);

        let locations = select_bad_pixel_locations(size, 50.0, 50.0, &mut rng).unwrap();
        assert_eq!(locations.hot.len() + locations.dead.len(), 64);

        let hot = coordinate_set(&locations.hot);
        let dead = coordinate_set(&locations.dead);
        assert!(hot.is_disjoint(&dead));
    }

    #[test]
    fn test_invalid_percentage_rejected() {
        let size = ImageSize::from_width_height(8, 8);
        let mut rng = StdRng::seed_from_u64(3);

        assert!(matches!(
            select_bad_pixel_locations(size, -1.0, 0.0, &mut rng),
            Err(DefectError::InvalidPercentage(_))
        ));
        assert!(matches!(
            select_bad_pixel_locations(size, 0.0, 100.5, &mut rng),
            Err(DefectError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn test_coordinates_in_bounds() {
        let size = ImageSize::from_width_height(17, 9);
        let mut rng = StdRng::seed_from_u64(4);

        let locations = select_bad_pixel_locations(size, 10.0, 10.0, &mut rng).unwrap();
        for &(row, col) in locations.hot.iter().chain(locations.dead.iter()) {
            assert!(row < 9 && col < 17);
        }
    }

    #[test]
    fn test_telegraphic_selection() {
        let size = ImageSize::from_width_height(20, 20);
        let mut rng = StdRng::seed_from_u64(5);

        let coords = select_telegraphic_locations(size, 5.0, &mut rng).unwrap();
        assert_eq!(coords.len(), 20);
        assert_eq!(coordinate_set(&coords).len(), 20);
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let size = ImageSize::from_width_height(16, 16);
        let mut rng_a = StdRng::seed_from_u64(77);
        let mut rng_b = StdRng::seed_from_u64(77);

        let a = select_bad_pixel_locations(size, 5.0, 5.0, &mut rng_a).unwrap();
        let b = select_bad_pixel_locations(size, 5.0, 5.0, &mut rng_b).unwrap();
        assert_eq!(a, b);
    }
}
