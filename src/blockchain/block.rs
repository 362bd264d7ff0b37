use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Previous-hash sentinel for blocks that have no real predecessor.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Errors that can occur while hashing a block
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("Failed to serialize block payload: {0}")]
    PayloadSerialization(#[from] serde_json::Error),
}

/// Represents a block in the blockchain
///
/// The payload type `T` is application-defined; anything serializable can be
/// recorded in a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block<T> {
    /// Index of the block in the chain
    pub index: u64,

    /// Timestamp when the block was created
    pub timestamp: DateTime<Utc>,

    /// Application payload carried by this block
    pub data: T,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Hash of the current block (calculated)
    pub hash: String,

    /// Counter incremented during mining until the hash meets the target
    pub nonce: u64,
}

impl<T: Serialize> Block<T> {
    /// Creates a new block
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `timestamp` - The creation timestamp, stored as given
    /// * `data` - The payload to record in the block
    ///
    /// # Returns
    ///
    /// A new Block with `nonce` 0, the genesis previous-hash sentinel, and its
    /// hash computed over the supplied fields
    pub fn new(index: u64, timestamp: DateTime<Utc>, data: T) -> Result<Self, BlockError> {
        Self::with_previous_hash(index, timestamp, data, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Creates a new block linked to a known predecessor hash
    ///
    /// Appending the block to a chain overwrites the link with the actual
    /// tail hash, so supplying one here only matters for blocks that are
    /// hashed or inspected before being appended.
    pub fn with_previous_hash(
        index: u64,
        timestamp: DateTime<Utc>,
        data: T,
        previous_hash: String,
    ) -> Result<Self, BlockError> {
        let mut block = Block {
            index,
            timestamp,
            data,
            previous_hash,
            hash: String::new(),
            nonce: 0,
        };

        block.hash = block.calculate_hash()?;

        Ok(block)
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block as a hexadecimal string
    pub fn calculate_hash(&self) -> Result<String, BlockError> {
        // Serialize the payload up front so an unserializable payload fails
        // here instead of producing an ambiguous digest. serde_json objects
        // keep sorted keys, so the same payload always serializes identically.
        let payload = serde_json::to_value(&self.data)?;

        let record = serde_json::json!({
            "index": self.index,
            "previous_hash": self.previous_hash,
            "timestamp": self.timestamp,
            "data": payload,
            "nonce": self.nonce,
        });

        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_string(&record)?.as_bytes());

        Ok(hex::encode(hasher.finalize()))
    }

    /// Mines the block until its hash starts with `difficulty` zeros
    ///
    /// Increments the nonce and recomputes the hash until the target is met.
    /// A block whose stored hash already meets the target is left untouched.
    /// There is no upper bound on iterations: a difficulty set too high keeps
    /// this loop busy indefinitely.
    pub fn proof_of_work(&mut self, difficulty: u8) -> Result<(), BlockError> {
        self.mine(difficulty, None)?;

        Ok(())
    }

    /// Mines the block with an attempt budget
    ///
    /// # Arguments
    ///
    /// * `difficulty` - The number of leading zeros required in the hash
    /// * `max_attempts` - The maximum number of nonce increments to try
    ///
    /// # Returns
    ///
    /// `Ok(true)` once the hash meets the target, `Ok(false)` if the budget
    /// runs out first (the block keeps its last tried nonce and hash)
    pub fn proof_of_work_capped(
        &mut self,
        difficulty: u8,
        max_attempts: u64,
    ) -> Result<bool, BlockError> {
        self.mine(difficulty, Some(max_attempts))
    }

    fn mine(&mut self, difficulty: u8, max_attempts: Option<u64>) -> Result<bool, BlockError> {
        let target = "0".repeat(usize::from(difficulty));
        let mut attempts: u64 = 0;

        while !self.hash.starts_with(&target) {
            if let Some(cap) = max_attempts {
                if attempts >= cap {
                    return Ok(false);
                }
            }

            self.nonce += 1;
            attempts += 1;
            self.hash = self.calculate_hash()?;
        }

        Ok(true)
    }
}
