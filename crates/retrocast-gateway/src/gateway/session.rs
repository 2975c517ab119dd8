//! Resumable session state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

/// Session shared between the connection driver (sole writer) and the client
/// handle's accessors.
pub(crate) type SharedSession = Arc<RwLock<Session>>;

/// What the client remembers about its server-side session.
///
/// `last_sequence` never decreases while the session lives; it only returns
/// to `None` through [`Session::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    session_id: Option<String>,
    last_sequence: Option<i64>,
    heartbeat_interval: Option<Duration>,
}

impl Session {
    /// Session id from the most recent READY.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Highest dispatch sequence seen.
    #[must_use]
    pub const fn last_sequence(&self) -> Option<i64> {
        self.last_sequence
    }

    /// Sequence to put in a RESUME frame.
    #[must_use]
    pub fn resume_sequence(&self) -> i64 {
        self.last_sequence.unwrap_or(0)
    }

    /// Interval announced by the most recent HELLO.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    /// Whether a RESUME can be attempted.
    #[must_use]
    pub const fn can_resume(&self) -> bool {
        self.session_id.is_some()
    }

    /// Record a dispatch sequence. Returns `true` if it advanced the session.
    pub(crate) fn observe_sequence(&mut self, seq: i64) -> bool {
        match self.last_sequence {
            Some(last) if last >= seq => false,
            _ => {
                self.last_sequence = Some(seq);
                true
            }
        }
    }

    pub(crate) fn establish(&mut self, session_id: String) {
        self.session_id = Some(session_id);
    }

    pub(crate) fn set_heartbeat_interval(&mut self, interval: Duration) {
        self.heartbeat_interval = Some(interval);
    }

    /// Forget everything; the next handshake will IDENTIFY.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::default();
        assert!(!session.can_resume());
        assert_eq!(session.last_sequence(), None);
        assert_eq!(session.resume_sequence(), 0);
        assert_eq!(session.heartbeat_interval(), None);
    }

    #[test]
    fn test_establish_enables_resume() {
        let mut session = Session::default();
        session.establish("abc".to_string());
        assert!(session.can_resume());
        assert_eq!(session.session_id(), Some("abc"));
    }

    #[test]
    fn test_sequence_ignores_replays() {
        let mut session = Session::default();
        assert!(session.observe_sequence(5));
        assert!(!session.observe_sequence(3));
        assert!(!session.observe_sequence(5));
        assert!(session.observe_sequence(6));
        assert_eq!(session.last_sequence(), Some(6));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut session = Session::default();
        session.establish("abc".to_string());
        session.observe_sequence(42);
        session.set_heartbeat_interval(Duration::from_secs(41));

        session.clear();

        assert_eq!(session, Session::default());
    }

    proptest! {
        #[test]
        fn last_sequence_is_running_max(seqs in proptest::collection::vec(any::<i64>(), 1..64)) {
            let mut session = Session::default();
            let mut previous = None;
            for seq in &seqs {
                session.observe_sequence(*seq);
                let current = session.last_sequence();
                prop_assert!(current >= previous);
                previous = current;
            }
            prop_assert_eq!(session.last_sequence(), seqs.iter().copied().max());
        }
    }
}
