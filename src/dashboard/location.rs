//! Coordinates for hotspots that were reported without a geolocation.
//!
//! There is no geocoding here. A `LocationResolver` turns a free-text location
//! into a point; the shipped resolvers either scatter points around the
//! monitored region or return one fixed point.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

pub trait LocationResolver: Send + Sync {
    fn resolve(&self, location: &str) -> Coordinates;
}

/// Uniformly random points in a square around a region centre.
#[derive(Debug)]
pub struct RandomRegionResolver {
    center: Coordinates,
    /// Half the side of the square, in degrees.
    spread: f64,
    rng: Mutex<StdRng>,
}

impl RandomRegionResolver {
    /// Central Sumatra, ±2 degrees on both axes.
    pub const SUMATRA: Coordinates = Coordinates {
        latitude: 0.5,
        longitude: 101.0,
    };
    pub const SUMATRA_SPREAD: f64 = 2.0;

    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            center: Self::SUMATRA,
            spread: Self::SUMATRA_SPREAD,
            rng: Mutex::new(rng),
        }
    }

    pub fn around(mut self, center: Coordinates, spread: f64) -> Self {
        self.center = center;
        self.spread = spread.abs();
        self
    }
}

impl Default for RandomRegionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationResolver for RandomRegionResolver {
    fn resolve(&self, _location: &str) -> Coordinates {
        // A poisoned lock only means another resolve panicked; the generator is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let lat_offset: f64 = rng.random::<f64>() - 0.5;
        let lon_offset: f64 = rng.random::<f64>() - 0.5;
        Coordinates {
            latitude: self.center.latitude + lat_offset * 2.0 * self.spread,
            longitude: self.center.longitude + lon_offset * 2.0 * self.spread,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedResolver(pub Coordinates);

impl LocationResolver for FixedResolver {
    fn resolve(&self, _location: &str) -> Coordinates {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_points_stay_inside_the_region() {
        let resolver = RandomRegionResolver::seeded(7);
        for _ in 0..500 {
            let point = resolver.resolve("anywhere");
            assert!((-1.5..=2.5).contains(&point.latitude), "{point:?}");
            assert!((99.0..=103.0).contains(&point.longitude), "{point:?}");
        }
    }

    #[test]
    fn seeded_resolvers_repeat() {
        let a = RandomRegionResolver::seeded(42);
        let b = RandomRegionResolver::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.resolve("Riau"), b.resolve("Riau"));
        }
    }

    #[test]
    fn custom_region() {
        let resolver = RandomRegionResolver::seeded(1).around(Coordinates::new(-3.0, 104.0), 0.5);
        let point = resolver.resolve("Palembang");
        assert!((-3.5..=-2.5).contains(&point.latitude));
        assert!((103.5..=104.5).contains(&point.longitude));
    }

    #[test]
    fn fixed_resolver_ignores_the_name() {
        let resolver = FixedResolver(Coordinates::new(2.0, 99.0));
        assert_eq!(resolver.resolve("North Sumatra"), Coordinates::new(2.0, 99.0));
        assert_eq!(resolver.resolve(""), Coordinates::new(2.0, 99.0));
    }
}
