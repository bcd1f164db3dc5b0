//! Tag verification.

use dawnlock_core::TagId;

/// Result of comparing a scanned tag with the registered credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagVerdict {
    /// Nothing registered; any scan dismisses.
    NoCredential,
    /// Scanned tag equals the registered one.
    Match,
    /// Wrong tag. Not counted, not rate-limited.
    Mismatch,
}

impl TagVerdict {
    /// Whether this verdict ends the session.
    pub fn dismisses(&self) -> bool {
        !matches!(self, TagVerdict::Mismatch)
    }
}

/// Compare `scanned` against `registered` in constant time.
pub fn verify_tag(registered: Option<&TagId>, scanned: &TagId) -> TagVerdict {
    match registered {
        None => TagVerdict::NoCredential,
        Some(registered) if registered == scanned => TagVerdict::Match,
        Some(_) => TagVerdict::Mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tag(s: &str) -> TagId {
        s.parse().unwrap()
    }

    #[test]
    fn test_verdicts() {
        let registered = tag("04:a2:2b:91");
        assert_eq!(verify_tag(None, &registered), TagVerdict::NoCredential);
        assert_eq!(verify_tag(Some(&registered), &tag("04:A2:2B:91")), TagVerdict::Match);
        assert_eq!(
            verify_tag(Some(&registered), &tag("04:a2:2b:92")),
            TagVerdict::Mismatch
        );
        assert!(!TagVerdict::Mismatch.dismisses());
    }

    proptest! {
        #[test]
        fn prop_dismisses_iff_equal_or_unregistered(
            registered in proptest::option::of(proptest::collection::vec(any::<u8>(), 4..=10)),
            scanned in proptest::collection::vec(any::<u8>(), 4..=10),
        ) {
            let registered_id = registered.clone().map(|b| TagId::from_bytes(b).unwrap());
            let scanned_id = TagId::from_bytes(scanned.clone()).unwrap();

            let verdict = verify_tag(registered_id.as_ref(), &scanned_id);
            let expected = registered.map_or(true, |r| r == scanned);

            prop_assert_eq!(verdict.dismisses(), expected);
        }
    }
}
