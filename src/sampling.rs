use rand::{distributions::WeightedIndex, prelude::*, rngs::SmallRng};
use rand_distr::{Distribution, Uniform};

pub fn small_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Samples uniformly from the inclusive range `[min, max]`.
pub fn sample_inclusive<R: Rng + ?Sized>(rng: &mut R, (min, max): (i32, i32)) -> i32 {
    Uniform::new_inclusive(min, max).sample(rng)
}

/// Samples uniformly from `[min, max]`; a degenerate range yields `min` without drawing.
pub fn sample_inclusive_f32<R: Rng + ?Sized>(rng: &mut R, (min, max): (f32, f32)) -> f32 {
    if min < max {
        Uniform::new_inclusive(min, max).sample(rng)
    } else {
        min
    }
}

pub fn sample_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    debug_assert!(len > 0);

    rng.gen_range(0, len)
}

/// Returns true with probability `p`.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f32) -> bool {
    rng.gen::<f32>() < p
}

/// Picks an index into `items` with probability proportional to `weight`. Returns `None` when there
/// is nothing to pick from, e.g. every weight is zero.
pub fn sample_weighted<R: Rng + ?Sized, T>(
    rng: &mut R,
    items: &[T],
    weight: impl Fn(&T) -> f32,
) -> Option<usize> {
    let dist = WeightedIndex::new(items.iter().map(|i| weight(i).max(0.0))).ok()?;

    Some(dist.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = small_rng(42);
        let mut b = small_rng(42);
        for _ in 0..16 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }

    #[test]
    fn test_inclusive_bounds() {
        let mut rng = small_rng(1);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let v = sample_inclusive(&mut rng, (2, 4));
            assert!((2..=4).contains(&v));
            seen[(v - 2) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(sample_inclusive(&mut rng, (7, 7)), 7);
        assert_eq!(sample_inclusive_f32(&mut rng, (1.5, 1.5)), 1.5);
    }

    #[test]
    fn test_weighted_skips_zero_weights() {
        let mut rng = small_rng(3);
        let items = [0.0f32, 2.0, 0.0];
        for _ in 0..50 {
            assert_eq!(sample_weighted(&mut rng, &items, |w| *w), Some(1));
        }
        assert_eq!(sample_weighted(&mut rng, &[0.0f32, 0.0], |w| *w), None);
        assert_eq!(sample_weighted::<_, f32>(&mut rng, &[], |w| *w), None);
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = small_rng(9);
        for _ in 0..50 {
            assert!(!chance(&mut rng, 0.0));
            assert!(chance(&mut rng, 1.0));
        }
    }
}
