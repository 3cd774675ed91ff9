/// Per-resource request sequencing.
///
/// Poll responses are never cancelled once issued, so a slow response can
/// arrive after a newer one was already applied. Each request takes a
/// monotonic sequence number for its resource; a response is applied only
/// when its number is still the latest issued for that resource.
use once_cell::sync::Lazy;
use std::sync::atomic::{ AtomicU64, Ordering };

#[derive(Debug, Default)]
pub struct ResourceSeq {
    latest: AtomicU64,
}

impl ResourceSeq {
    pub const fn new() -> Self {
        Self { latest: AtomicU64::new(0) }
    }

    /// Issue the next sequence number for this resource
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True when `seq` is still the latest issued number
    pub fn is_current(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == seq
    }
}

/// One sequencer per polled resource
pub struct Sequencers {
    pub bot_status: ResourceSeq,
    pub dashboard: ResourceSeq,
    pub positions: ResourceSeq,
}

pub static SEQUENCERS: Lazy<Sequencers> = Lazy::new(|| Sequencers {
    bot_status: ResourceSeq::new(),
    dashboard: ResourceSeq::new(),
    positions: ResourceSeq::new(),
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_are_monotonic() {
        let seq = ResourceSeq::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(second > first);
    }

    #[test]
    fn test_stale_response_is_not_current() {
        let seq = ResourceSeq::new();

        // Two requests in flight; the older one must be discarded
        let older = seq.issue();
        let newer = seq.issue();

        assert!(!seq.is_current(older));
        assert!(seq.is_current(newer));
    }

    #[test]
    fn test_resources_sequence_independently() {
        let sequencers = Sequencers {
            bot_status: ResourceSeq::new(),
            dashboard: ResourceSeq::new(),
            positions: ResourceSeq::new(),
        };

        let status_seq = sequencers.bot_status.issue();
        sequencers.dashboard.issue();
        sequencers.dashboard.issue();

        // Dashboard traffic must not invalidate the status request
        assert!(sequencers.bot_status.is_current(status_seq));
    }
}
