use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, RngCore, SeedableRng};

// CONSTANTS
// ================================================================================================

/// Length of every password produced by [DummyPasswordGenerator].
pub const PASSWORD_LENGTH: usize = 64;

// PASSWORD GENERATOR
// ================================================================================================

/// A source of benchmark passwords.
pub trait PasswordGenerator {
    /// Returns the next password.
    ///
    /// The returned slice may point into storage reused by the next call, so it has to be
    /// consumed before another password is requested.
    fn next_password(&mut self) -> &[u8];
}

/// Produces pseudo-random passwords of [PASSWORD_LENGTH] bytes into a single reused buffer.
///
/// The default seed comes from the system clock, so successive runs hash different data.
#[derive(Debug, Clone)]
pub struct DummyPasswordGenerator {
    rng: StdRng,
    password: [u8; PASSWORD_LENGTH],
}

impl DummyPasswordGenerator {
    /// Returns a generator seeded from the current time.
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_seed(seed)
    }

    /// Returns a generator producing a reproducible password stream.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            password: [0; PASSWORD_LENGTH],
        }
    }
}

impl Default for DummyPasswordGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordGenerator for DummyPasswordGenerator {
    fn next_password(&mut self) -> &[u8] {
        self.rng.fill_bytes(&mut self.password);
        &self.password
    }
}
