/// Password hashing primitive. Implementations are CPU-heavy and blocking;
/// callers run them on the blocking pool.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String>;

    /// `Ok(false)` on mismatch; `Err` only for unreadable hashes.
    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool>;
}
