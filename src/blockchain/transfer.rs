use serde::{Deserialize, Serialize};

/// A simple value transfer recorded as block payload
///
/// This is the payload the demo driver mines into blocks. Nothing is
/// validated: sender, recipient, and quantity are recorded as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Sender's display name
    pub sender: String,

    /// Recipient's display name
    pub recipient: String,

    /// Amount being transferred
    pub quantity: f64,
}

impl Transfer {
    /// Creates a new transfer
    pub fn new(sender: &str, recipient: &str, quantity: f64) -> Self {
        Transfer {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            quantity,
        }
    }
}
