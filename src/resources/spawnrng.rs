use bevy_ecs::prelude::*;

/// Random source for piece selection and placement.
#[derive(Resource, Debug, Clone)]
pub struct SpawnRng(pub fastrand::Rng);

impl SpawnRng {
    /// Seeded generator; a seed of 0 draws a fresh random seed.
    pub fn new(seed: u64) -> Self {
        if seed == 0 {
            Self(fastrand::Rng::new())
        } else {
            Self(fastrand::Rng::with_seed(seed))
        }
    }
}

impl Default for SpawnRng {
    fn default() -> Self {
        Self::new(0)
    }
}
