//! Hardware-id parsing and the wine-signature constant set used for
//! multi-account detection during login (§4.7 steps 5/7, Glossary "HWID").
//!
//! Grounded on `userUtils.logHardware`/`verifyUser` in the original
//! source: the fifth handshake field is five colon-separated tokens, and
//! two of them have a small set of well-known "this is really wine, not
//! a second machine" values that relax the uniqueness check.

/// The five-tuple the client sends as the handshake's fifth `|`-separated
/// field: osu-version, plain MAC list, MAC hash, unique id, disk id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareIds {
    pub osu_version: String,
    pub mac_list: String,
    pub mac_hash: String,
    pub unique_id: String,
    pub disk_id: String,
}

impl HardwareIds {
    /// Parses the colon-separated five-tuple. The source treats fewer
    /// than 4 tokens as "force update" territory (ancient clients don't
    /// send hardware data at all); this mirrors that by requiring 5
    /// present tokens, allowing the last (disk id) to be empty only when
    /// unavailable on the client's platform.
    pub fn parse(field: &str) -> Option<Self> {
        let parts: Vec<&str> = field.split(':').collect();
        if parts.len() < 4 {
            return None;
        }
        Some(Self {
            osu_version: parts[0].to_owned(),
            mac_list: parts.get(1).copied().unwrap_or("").to_owned(),
            mac_hash: parts.get(2).copied().unwrap_or("").to_owned(),
            unique_id: parts.get(3).copied().unwrap_or("").to_owned(),
            disk_id: parts.get(4).copied().unwrap_or("").to_owned(),
        })
    }

    /// The hashes that must all be non-empty for hardware logging/
    /// verification to proceed (§4.7 step 7, source `hashes[2:5]`).
    pub fn has_reliable_hashes(&self) -> bool {
        !self.mac_hash.is_empty() && !self.unique_id.is_empty() && !self.disk_id.is_empty()
    }

    /// True when this hardware signature is a known wine marker rather
    /// than a real distinguishing machine id (§9 Open Questions, a named
    /// extensible constant set rather than an inline pair).
    pub fn is_wine(&self) -> bool {
        WINE_HWID_SIGNATURES
            .iter()
            .any(|sig| sig == &self.mac_hash.as_str() || sig == &self.disk_id.as_str())
    }
}

/// Known-wine hardware signatures: real osu! under wine reports the same
/// mac-hash/disk-id on unrelated physical machines, so a match against
/// these must not by itself be treated as proof of a multi-account.
pub const WINE_HWID_SIGNATURES: &[&str] = &[
    "b4ec3c4334a0249dae95c284ec5983df",
    "ffae06fb022871fe9beb58b005c5e21d",
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_five_colon_separated_tokens() {
        let ids = HardwareIds::parse("b20230101.1:01:02:03:04").unwrap();
        assert_eq!(ids.osu_version, "b20230101.1");
        assert_eq!(ids.unique_id, "03");
        assert_eq!(ids.disk_id, "04");
    }

    #[test]
    fn too_few_tokens_is_none() {
        assert!(HardwareIds::parse("b20230101.1:01:02").is_none());
    }

    #[test]
    fn wine_mac_hash_is_detected() {
        let ids = HardwareIds::parse("v:01:b4ec3c4334a0249dae95c284ec5983df:uid:disk").unwrap();
        assert!(ids.is_wine());
    }

    #[test]
    fn ordinary_hashes_are_not_wine() {
        let ids = HardwareIds::parse("v:01:aa:bb:cc").unwrap();
        assert!(!ids.is_wine());
    }
}
