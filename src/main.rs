use anyhow::Result;
use chrono::Utc;
use log::info;

mod blockchain;

use blockchain::{Block, Blockchain, Transfer};

/// Difficulty used by the demo chain
const DEMO_DIFFICULTY: u8 = 4;

// Build the demo chain: two sample transfers mined on top of genesis
fn build_demo_chain() -> Result<Blockchain<Transfer>> {
    let mut chain = Blockchain::new(DEMO_DIFFICULTY)?;

    chain.add_block(Block::new(
        1,
        Utc::now(),
        Transfer::new("Alexis", "Badr", 50.0),
    )?)?;

    chain.add_block(Block::new(
        2,
        Utc::now(),
        Transfer::new("Badr", "Chen", 100.0),
    )?)?;

    Ok(chain)
}

// Dump the whole chain as pretty-printed JSON along with its validity verdict
fn report_chain(chain: &Blockchain<Transfer>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(chain)?);
    println!("Chain valid: {}", chain.is_valid());

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Mining demo chain at difficulty {}", DEMO_DIFFICULTY);

    let chain = build_demo_chain()?;
    report_chain(&chain)
}
