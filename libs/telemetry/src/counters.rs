use ::metrics::counter;

pub const WEBHOOK_MESSAGES_RECEIVED: &str = "webhook_messages_received";
pub const WEBHOOK_FRAGMENTS_SKIPPED: &str = "webhook_fragments_skipped";
pub const WEBHOOK_VERIFICATIONS: &str = "webhook_verifications";

/// Counts normalized messages and skipped fragments from one delivery.
pub fn record_webhook_delivery(received: usize, skipped: usize) {
    counter!(WEBHOOK_MESSAGES_RECEIVED).increment(received as u64);
    if skipped > 0 {
        counter!(WEBHOOK_FRAGMENTS_SKIPPED).increment(skipped as u64);
    }
}

/// Counts a subscription verification attempt by outcome
/// (`accepted`, `rejected`, `misconfigured`, `malformed`).
pub fn record_verification(outcome: &'static str) {
    counter!(WEBHOOK_VERIFICATIONS, "outcome" => outcome).increment(1);
}
