use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::block::{Block, BlockError};

/// Represents the blockchain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blockchain<T> {
    /// The chain of blocks, genesis first
    blocks: Vec<Block<T>>,

    /// Mining difficulty (number of leading zeros required in hash)
    difficulty: u8,
}

impl<T: Serialize + Default> Blockchain<T> {
    /// Creates a new blockchain with a genesis block
    ///
    /// # Arguments
    ///
    /// * `difficulty` - The number of leading zeros every mined block's hash
    ///   must carry; fixed for the lifetime of the chain
    ///
    /// # Returns
    ///
    /// A new Blockchain holding only the genesis block
    pub fn new(difficulty: u8) -> Result<Self, BlockError> {
        let genesis = Self::create_genesis_block()?;

        info!("Created genesis block with hash {}", genesis.hash);

        Ok(Blockchain {
            blocks: vec![genesis],
            difficulty,
        })
    }

    /// Creates the genesis block (first block in the chain)
    ///
    /// Genesis is never mined: its hash is whatever the hash function yields
    /// for nonce 0, and it is exempt from the difficulty target.
    fn create_genesis_block() -> Result<Block<T>, BlockError> {
        Block::new(0, DateTime::<Utc>::UNIX_EPOCH, T::default())
    }
}

impl<T: Serialize> Blockchain<T> {
    /// Gets the last block in the chain
    pub fn latest_block(&self) -> &Block<T> {
        self.blocks
            .last()
            .expect("chain always contains the genesis block")
    }

    /// Mines a block onto the end of the chain
    ///
    /// Stamps the block's previous-hash from the current tail, mines it
    /// against the chain's difficulty, and appends it. The block's index is
    /// taken on faith: an out-of-order index is not rejected here and only
    /// shows up when the caller inspects the chain.
    ///
    /// # Arguments
    ///
    /// * `block` - The block to link, mine, and append
    pub fn add_block(&mut self, mut block: Block<T>) -> Result<(), BlockError> {
        block.previous_hash = self.latest_block().hash.clone();
        block.proof_of_work(self.difficulty)?;

        info!(
            "Mined block {} with nonce {} and hash {}",
            block.index, block.nonce, block.hash
        );

        self.blocks.push(block);

        Ok(())
    }

    /// Validates the blockchain
    ///
    /// Walks the chain from the block after genesis, checking that every
    /// block's stored hash matches a fresh recomputation and that it links to
    /// its predecessor's hash. Read-only; repeated calls return the same
    /// verdict.
    ///
    /// # Returns
    ///
    /// true if the blockchain is valid, false otherwise
    pub fn is_valid(&self) -> bool {
        for i in 1..self.blocks.len() {
            let current = &self.blocks[i];
            let previous = &self.blocks[i - 1];

            // Check if the hash is correct
            let recomputed = match current.calculate_hash() {
                Ok(hash) => hash,
                Err(_) => return false,
            };
            if current.hash != recomputed {
                return false;
            }

            // Check if the previous hash is correct
            if current.previous_hash != previous.hash {
                return false;
            }
        }

        true
    }

    /// Gets the blocks of the chain, genesis first
    pub fn blocks(&self) -> &[Block<T>] {
        &self.blocks
    }

    /// Gets the number of blocks in the chain, genesis included
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the chain holds at least the genesis block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Gets the chain's mining difficulty
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::transfer::Transfer;

    fn chain_with_two_blocks(difficulty: u8) -> Blockchain<Transfer> {
        let mut chain = Blockchain::new(difficulty).unwrap();

        chain
            .add_block(
                Block::new(1, Utc::now(), Transfer::new("Alexis", "Badr", 50.0)).unwrap(),
            )
            .unwrap();
        chain
            .add_block(
                Block::new(2, Utc::now(), Transfer::new("Badr", "Chen", 100.0)).unwrap(),
            )
            .unwrap();

        chain
    }

    #[test]
    fn test_new_blockchain() {
        let chain: Blockchain<Transfer> = Blockchain::new(2).unwrap();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain.blocks()[0].index, 0);
        assert_eq!(chain.blocks()[0].previous_hash, "0");
        assert_eq!(chain.blocks()[0].nonce, 0);
        assert!(chain.is_valid());
    }

    #[test]
    fn test_add_block_links_to_tail() {
        let mut chain: Blockchain<Transfer> = Blockchain::new(1).unwrap();
        let tail_hash = chain.latest_block().hash.clone();

        let block = Block::new(1, Utc::now(), Transfer::new("Alexis", "Badr", 50.0)).unwrap();
        chain.add_block(block).unwrap();

        let appended = chain.latest_block();
        assert_eq!(appended.index, 1);
        assert_eq!(appended.previous_hash, tail_hash);
        assert_eq!(appended.hash, appended.calculate_hash().unwrap());
    }

    #[test]
    fn test_chain_end_to_end() {
        let chain = chain_with_two_blocks(2);

        assert_eq!(chain.len(), 3);
        assert!(chain.is_valid());
        assert!(chain.blocks()[1].hash.starts_with("00"));
        assert!(chain.blocks()[2].hash.starts_with("00"));
    }

    #[test]
    fn test_tampered_data_detected() {
        let mut chain = chain_with_two_blocks(1);

        chain.blocks[1].data.quantity = 9_999.0;

        assert!(!chain.is_valid());
    }

    #[test]
    fn test_tampered_nonce_detected() {
        let mut chain = chain_with_two_blocks(1);

        chain.blocks[2].nonce += 1;

        assert!(!chain.is_valid());
    }

    #[test]
    fn test_tampered_block_with_recomputed_hash_detected() {
        let mut chain = chain_with_two_blocks(1);

        // Rewrite the middle block and recompute its own hash. The block is
        // self-consistent again, but the next block still links to the old
        // hash.
        chain.blocks[1].data.quantity = 9_999.0;
        chain.blocks[1].hash = chain.blocks[1].calculate_hash().unwrap();

        assert!(!chain.is_valid());
    }

    #[test]
    fn test_is_valid_is_idempotent() {
        let chain = chain_with_two_blocks(1);
        let hashes_before: Vec<String> = chain.blocks().iter().map(|b| b.hash.clone()).collect();

        assert!(chain.is_valid());
        assert!(chain.is_valid());

        let hashes_after: Vec<String> = chain.blocks().iter().map(|b| b.hash.clone()).collect();
        assert_eq!(hashes_before, hashes_after);
    }

    #[test]
    fn test_chain_dump_is_pretty_printable() {
        let chain = chain_with_two_blocks(1);

        let dump = serde_json::to_string_pretty(&chain).unwrap();

        assert!(dump.contains("\"blocks\""));
        assert!(dump.contains("\"difficulty\""));
        assert!(dump.contains(&chain.latest_block().hash));
    }
}
