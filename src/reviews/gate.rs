//! Review admission gate

use tracing::debug;

use crate::session::SessionStore;
use crate::types::{BookwormError, Result};

/// Why a review was let through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The client asserted verification and the policy trusts it
    InlineFlag,
    /// The session passed the book's quiz
    SessionVerified,
    /// The book has no quiz
    NoQuiz,
}

/// Admission policy for new reviews
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionPolicy {
    /// Accept the client's `verified` flag without checking the session
    pub trust_inline_flag: bool,
}

impl AdmissionPolicy {
    pub fn new(trust_inline_flag: bool) -> Self {
        Self { trust_inline_flag }
    }

    /// Decide from already-resolved facts
    pub fn decide(
        &self,
        inline_verified: bool,
        session_verified: bool,
        quiz_len: usize,
    ) -> Option<Admission> {
        if inline_verified && self.trust_inline_flag {
            Some(Admission::InlineFlag)
        } else if session_verified {
            Some(Admission::SessionVerified)
        } else if quiz_len == 0 {
            Some(Admission::NoQuiz)
        } else {
            None
        }
    }

    pub fn can_review(
        &self,
        sessions: &SessionStore,
        session_id: &str,
        book_id: i64,
        quiz_len: usize,
        inline_verified: bool,
    ) -> bool {
        self.decide(
            inline_verified,
            sessions.is_verified(session_id, book_id),
            quiz_len,
        )
        .is_some()
    }

    /// Like [`can_review`](Self::can_review) but fails with `NotVerified`
    pub fn admit(
        &self,
        sessions: &SessionStore,
        session_id: &str,
        book_id: i64,
        quiz_len: usize,
        inline_verified: bool,
    ) -> Result<Admission> {
        match self.decide(
            inline_verified,
            sessions.is_verified(session_id, book_id),
            quiz_len,
        ) {
            Some(admission) => {
                debug!("Review for book {} admitted: {:?}", book_id, admission);
                Ok(admission)
            }
            None => {
                debug!("Review for book {} rejected: not verified", book_id);
                Err(BookwormError::NotVerified(book_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_truth_table() {
        for trust in [false, true] {
            let policy = AdmissionPolicy::new(trust);
            for inline in [false, true] {
                for verified in [false, true] {
                    for quiz_len in [0usize, 3] {
                        let expected = (inline && trust) || verified || quiz_len == 0;
                        assert_eq!(
                            policy.decide(inline, verified, quiz_len).is_some(),
                            expected,
                            "trust={} inline={} verified={} quiz_len={}",
                            trust,
                            inline,
                            verified,
                            quiz_len
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_untrusted_inline_flag_is_ignored() {
        let policy = AdmissionPolicy::default();
        assert_eq!(policy.decide(true, false, 3), None);
    }

    #[test]
    fn test_admit_against_sessions() {
        let sessions = SessionStore::new(Duration::from_secs(60), 10);
        let sid = sessions.open(7);
        let policy = AdmissionPolicy::default();

        assert!(matches!(
            policy.admit(&sessions, &sid, 1, 3, false),
            Err(BookwormError::NotVerified(1))
        ));
        assert_eq!(
            policy.admit(&sessions, &sid, 1, 0, false).unwrap(),
            Admission::NoQuiz
        );

        sessions.mark_verified(&sid, 1).unwrap();
        assert_eq!(
            policy.admit(&sessions, &sid, 1, 3, false).unwrap(),
            Admission::SessionVerified
        );
        assert!(!policy.can_review(&sessions, &sid, 2, 3, false));

        let fresh = sessions.open(7);
        assert!(!policy.can_review(&sessions, &fresh, 1, 3, false));
    }
}
