//! Short identifier generation

use std::sync::{Arc, Mutex, PoisonError};

use rand::{distr::Alphanumeric, rngs::StdRng, Rng, SeedableRng};

/// Length used when `ID_LENGTH` is not configured
pub const DEFAULT_ID_LENGTH: usize = 8;

/// Accepted range for a configured id length
pub const MIN_ID_LENGTH: usize = 4;
pub const MAX_ID_LENGTH: usize = 32;

/// Mints short, URL-safe identifiers
///
/// Tokens are drawn from `[A-Za-z0-9]` only, so they never contain a reserved
/// path character. The generator does not look at the store; uniqueness is
/// settled by the caller, which retries on a duplicate key.
///
/// Clones of a seeded generator share one random stream.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    length: usize,
    seeded: Option<Arc<Mutex<StdRng>>>,
}

impl IdGenerator {
    /// Creates a generator producing ids of `length` characters
    ///
    /// The length is clamped to [`MIN_ID_LENGTH`]..=[`MAX_ID_LENGTH`].
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_ID_LENGTH, MAX_ID_LENGTH),
            seeded: None,
        }
    }

    /// Creates a generator whose ids are a fixed sequence for a given `seed`
    ///
    /// Two generators built with the same length and seed produce the same ids
    /// in the same order.
    pub fn seeded(length: usize, seed: u64) -> Self {
        Self {
            seeded: Some(Arc::new(Mutex::new(StdRng::seed_from_u64(seed)))),
            ..Self::new(length)
        }
    }

    /// Number of characters in every generated id
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generates a token for `long_url`
    ///
    /// The token is random; the URL only shows up in the trace log.
    pub fn generate(&self, long_url: &str) -> String {
        let id = match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                sample(&mut *rng, self.length)
            }
            None => sample(rand::rng(), self.length),
        };

        tracing::trace!(%id, %long_url, "minted short id");
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

fn sample<R: Rng>(rng: R, length: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
