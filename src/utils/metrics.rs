//! Decoder statistics
//!
//! Counters describing what a single stream decoder has seen. Each decoder
//! owns its own counters, so connections never share mutable state and no
//! atomics are needed.

use tracing::info;

/// Per-decoder counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Bytes handed to the decoder
    pub bytes_fed: u64,
    /// Packets emitted
    pub packets_decoded: u64,
    /// Candidate frames rejected
    pub frames_rejected: u64,
    /// Bytes before a sync marker, thrown away while seeking
    pub noise_bytes: u64,
    /// All bytes dropped without becoming part of a packet
    pub bytes_discarded: u64,
}

impl DecoderStats {
    /// Share of candidate frames that were rejected, in `[0, 1]`
    pub fn rejection_rate(&self) -> f64 {
        let total = self.packets_decoded + self.frames_rejected;
        if total == 0 {
            0.0
        } else {
            self.frames_rejected as f64 / total as f64
        }
    }

    /// Log current counters
    pub fn log_stats(&self, connection: &str) {
        info!(
            connection,
            bytes_fed = self.bytes_fed,
            packets_decoded = self.packets_decoded,
            frames_rejected = self.frames_rejected,
            noise_bytes = self.noise_bytes,
            bytes_discarded = self.bytes_discarded,
            rejection_rate = self.rejection_rate(),
            "Decoder stats snapshot"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_rate() {
        let mut stats = DecoderStats::default();
        assert_eq!(stats.rejection_rate(), 0.0);

        stats.packets_decoded = 3;
        stats.frames_rejected = 1;
        assert!((stats.rejection_rate() - 0.25).abs() < f64::EPSILON);
    }
}
