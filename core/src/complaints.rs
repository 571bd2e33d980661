//! Complaint cross-reference: the set of addresses citizens have reported.

use crate::error::DetectorResult;
use std::collections::HashSet;

/// Read side of the complaint store. Returns raw address strings; entries
/// with no address are already excluded.
pub trait ComplaintSource {
    fn complaint_addresses(&self) -> DetectorResult<Vec<String>>;
}

/// Trim, collapse inner whitespace, lowercase.
pub fn normalize_address(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Normalised complaint addresses, fixed for the duration of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintAddressSet {
    addresses: HashSet<String>,
}

impl ComplaintAddressSet {
    pub fn contains(&self, address: &str) -> bool {
        let key = normalize_address(address);
        !key.is_empty() && self.addresses.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ComplaintAddressSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            addresses: iter
                .into_iter()
                .map(|a| normalize_address(a.as_ref()))
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

/// Load complaint addresses. A failing store degrades to an empty set;
/// the cycle carries on without complaint evidence.
pub fn load_complaint_addresses<C: ComplaintSource + ?Sized>(source: &C) -> ComplaintAddressSet {
    match source.complaint_addresses() {
        Ok(addresses) => {
            let set: ComplaintAddressSet = addresses.into_iter().collect();
            log::debug!("Loaded {} distinct complaint addresses", set.len());
            set
        }
        Err(e) => {
            log::warn!("Complaint store read failed, continuing without complaints: {e}");
            ComplaintAddressSet::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectorError;

    struct Broken;

    impl ComplaintSource for Broken {
        fn complaint_addresses(&self) -> DetectorResult<Vec<String>> {
            Err(DetectorError::SourceUnavailable {
                source_name: "complaint store",
                reason: "connection refused".into(),
            })
        }
    }

    #[test]
    fn failure_degrades_to_empty_set() {
        assert!(load_complaint_addresses(&Broken).is_empty());
    }

    #[test]
    fn matching_ignores_spacing_and_case() {
        let set: ComplaintAddressSet = ["  Lenina St  12 ", "lenina st 12", ""].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains("LENINA ST 12"));
        assert!(!set.contains(""));
        assert!(!set.contains("Lenina St 14"));
    }
}
