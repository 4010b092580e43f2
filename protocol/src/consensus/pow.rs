//! # Proof of Work
//!
//! The puzzle: find the smallest `proof` such that
//! `sha256_hex(decimal(last_proof) || decimal(proof))` ends with the
//! difficulty suffix (`"0000"` by default). Candidates are tried in order
//! 0, 1, 2, ... so every honest miner finds the same proof for a given
//! predecessor.
//!
//! [`proof_of_work`] is the literal search: synchronous, CPU-bound and with
//! no bound on the number of attempts. [`ProofSearch`] is the same search
//! with a cancellation flag and an optional deadline, and
//! [`mine_off_thread`] runs one on tokio's blocking pool so request handlers
//! keep serving while a block is being mined.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{DEFAULT_DIFFICULTY_SUFFIX, MAX_DIFFICULTY_LEN, POW_CHECK_INTERVAL};
use crate::crypto::hash::sha256_hex;

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Errors produced when parsing a [`Difficulty`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifficultyError {
    /// An empty suffix would accept every proof.
    #[error("difficulty suffix must not be empty")]
    Empty,

    /// Longer than a SHA-256 hex digest; unsatisfiable.
    #[error("difficulty suffix longer than {max} characters: {len}")]
    TooLong { len: usize, max: usize },

    /// Digests are lowercase hex, so anything else can never match.
    #[error("difficulty suffix must be lowercase hex: {0:?}")]
    NotHex(String),
}

/// The fixed hex suffix a proof digest must end with.
///
/// There is no retargeting. The suffix is configurable per node, but nodes
/// with different suffixes reject each other's chains.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Difficulty(String);

impl Difficulty {
    /// Validates and wraps a suffix.
    pub fn new(suffix: impl Into<String>) -> Result<Self, DifficultyError> {
        let suffix = suffix.into();
        if suffix.is_empty() {
            return Err(DifficultyError::Empty);
        }
        if suffix.len() > MAX_DIFFICULTY_LEN {
            return Err(DifficultyError::TooLong {
                len: suffix.len(),
                max: MAX_DIFFICULTY_LEN,
            });
        }
        if !suffix
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(DifficultyError::NotHex(suffix));
        }
        Ok(Self(suffix))
    }

    /// The hex suffix.
    pub fn suffix(&self) -> &str {
        &self.0
    }

    /// Checks a candidate proof against its predecessor's proof.
    pub fn accepts(&self, last_proof: u64, proof: u64) -> bool {
        let guess = format!("{}{}", last_proof, proof);
        sha256_hex(guess.as_bytes()).ends_with(self.0.as_str())
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(DEFAULT_DIFFICULTY_SUFFIX.to_string())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Plain search
// ---------------------------------------------------------------------------

/// `true` if `proof` solves the puzzle for `last_proof` at the default
/// difficulty.
pub fn is_valid_proof(last_proof: u64, proof: u64) -> bool {
    Difficulty::default().accepts(last_proof, proof)
}

/// Finds the first proof for `last_proof` at the default difficulty.
///
/// Blocks the calling thread until a proof is found. There is no upper bound
/// on attempts and no way to cancel; use [`ProofSearch`] for that.
pub fn proof_of_work(last_proof: u64) -> u64 {
    proof_of_work_with(last_proof, &Difficulty::default())
}

/// [`proof_of_work`] against an explicit difficulty.
pub fn proof_of_work_with(last_proof: u64, difficulty: &Difficulty) -> u64 {
    let mut proof = 0u64;
    while !difficulty.accepts(last_proof, proof) {
        proof = proof.wrapping_add(1);
    }
    proof
}

// ---------------------------------------------------------------------------
// MiningError
// ---------------------------------------------------------------------------

/// Why a bounded search or a mining attempt ended without a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiningError {
    /// The cancellation flag was raised.
    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    /// The deadline passed before a proof was found.
    #[error("mining timed out after {elapsed_ms}ms ({attempts} attempts)")]
    TimedOut { attempts: u64, elapsed_ms: u64 },

    /// Every `u64` candidate was tried.
    #[error("mining exhausted the proof space without a solution")]
    Exhausted,

    /// Another block was committed while this proof was being searched, so
    /// the proof no longer extends the tip.
    #[error("chain tip moved during mining: expected block {expected}, tip is now {found}")]
    StaleTip { expected: u64, found: u64 },

    /// The blocking worker panicked or was aborted.
    #[error("mining worker failed: {0}")]
    Worker(String),
}

// ---------------------------------------------------------------------------
// ProofSearch
// ---------------------------------------------------------------------------

/// Caller-side knobs for a mining attempt.
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Raising this flag stops the search at the next checkpoint.
    pub cancel: Option<Arc<AtomicBool>>,

    /// Wall-clock budget for the search.
    pub timeout: Option<Duration>,
}

/// A cancellable, deadline-aware proof search.
///
/// The cancellation flag and the deadline are polled every
/// [`POW_CHECK_INTERVAL`] candidates, so stopping is prompt but not
/// instantaneous.
#[derive(Debug, Clone)]
pub struct ProofSearch {
    difficulty: Difficulty,
    cancel: Option<Arc<AtomicBool>>,
    timeout: Option<Duration>,
}

impl ProofSearch {
    /// An unbounded search at `difficulty`.
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            cancel: None,
            timeout: None,
        }
    }

    /// Applies the cancellation flag and timeout from `options`.
    pub fn with_options(mut self, options: &MiningOptions) -> Self {
        self.cancel = options.cancel.clone();
        self.timeout = options.timeout;
        self
    }

    /// Stops the search when `flag` becomes `true`.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Gives up once `timeout` has elapsed since [`ProofSearch::run`] began.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The difficulty this search solves for.
    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    /// Runs the search on the current thread.
    pub fn run(&self, last_proof: u64) -> Result<u64, MiningError> {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        let mut attempts = 0u64;

        for proof in 0..=u64::MAX {
            if attempts % POW_CHECK_INTERVAL == 0 {
                self.checkpoint(attempts, started, deadline)?;
            }
            if self.difficulty.accepts(last_proof, proof) {
                tracing::debug!(last_proof, proof, attempts, "proof found");
                return Ok(proof);
            }
            attempts += 1;
        }

        Err(MiningError::Exhausted)
    }

    fn checkpoint(
        &self,
        attempts: u64,
        started: Instant,
        deadline: Option<Instant>,
    ) -> Result<(), MiningError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(MiningError::Cancelled { attempts });
            }
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(MiningError::TimedOut {
                    attempts,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

/// Runs `search` on tokio's blocking thread pool.
pub async fn mine_off_thread(search: ProofSearch, last_proof: u64) -> Result<u64, MiningError> {
    tokio::task::spawn_blocking(move || search.run(last_proof))
        .await
        .map_err(|e| MiningError::Worker(e.to_string()))?
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
