use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the manager id and the lecture id in a code.
pub const SEPARATOR: char = '-';

/// Fixed key a pending code is stashed under between the referral landing
/// and the signup that consumes it.
pub const PENDING_CODE_KEY: &str = "referral_code";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferralError {
    #[error("referral ids must not be empty")]
    EmptyId,

    #[error("referral id contains the separator: {0}")]
    SeparatorInId(String),
}

/// Decoded referral attribution. Codes always split into exactly these two
/// parts; ids containing the separator are rejected at encode time, so the
/// round trip is exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralCode {
    pub rm_id: String,
    pub lecture_id: String,
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.rm_id, SEPARATOR, self.lecture_id)
    }
}

pub fn encode(rm_id: &str, lecture_id: &str) -> Result<String, ReferralError> {
    for id in [rm_id, lecture_id] {
        if id.is_empty() {
            return Err(ReferralError::EmptyId);
        }
        if id.contains(SEPARATOR) {
            return Err(ReferralError::SeparatorInId(id.to_string()));
        }
    }
    Ok(format!("{rm_id}{SEPARATOR}{lecture_id}"))
}

/// `None` for anything that is not a well-formed code; the consuming flow
/// treats that as "no referral", never as an error.
pub fn decode(code: &str) -> Option<ReferralCode> {
    let (rm_id, lecture_id) = code.split_once(SEPARATOR)?;
    if rm_id.is_empty() || lecture_id.is_empty() || lecture_id.contains(SEPARATOR) {
        return None;
    }
    Some(ReferralCode {
        rm_id: rm_id.to_string(),
        lecture_id: lecture_id.to_string(),
    })
}

pub fn is_valid(code: &str) -> bool {
    decode(code).is_some()
}

pub fn lecture_id_from_code(code: &str) -> Option<String> {
    decode(code).map(|c| c.lecture_id)
}

/// Shareable signup URL embedding the code as the `ref` query parameter —
/// the one wire-level contract this module produces and parses.
pub fn referral_url(base: &str, rm_id: &str, lecture_id: &str) -> Result<String, ReferralError> {
    let code = encode(rm_id, lecture_id)?;
    Ok(format!("{}/signup?ref={}", base.trim_end_matches('/'), code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode("rm1", "l42").unwrap(), "rm1-l42");
    }

    #[test]
    fn test_encode_rejects_bad_ids() {
        assert_eq!(encode("", "l42"), Err(ReferralError::EmptyId));
        assert_eq!(encode("rm1", ""), Err(ReferralError::EmptyId));
        assert_eq!(
            encode("rm-1", "l42"),
            Err(ReferralError::SeparatorInId("rm-1".to_string()))
        );
        assert_eq!(
            encode("rm1", "l-42"),
            Err(ReferralError::SeparatorInId("l-42".to_string()))
        );
    }

    #[test]
    fn test_decode() {
        let code = decode("rm1-l42").expect("valid code");
        assert_eq!(code.rm_id, "rm1");
        assert_eq!(code.lecture_id, "l42");
    }

    #[test]
    fn test_decode_rejects_malformed_codes() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("onlyonepart"), None);
        assert_eq!(decode("-l42"), None);
        assert_eq!(decode("rm1-"), None);
        assert_eq!(decode("a-b-c"), None);
    }

    #[test]
    fn test_round_trip() {
        for (rm_id, lecture_id) in [("rm1", "l42"), ("rm7", "l99"), ("a", "b")] {
            let code = encode(rm_id, lecture_id).unwrap();
            let decoded = decode(&code).expect("encoded code decodes");
            assert_eq!(decoded.rm_id, rm_id);
            assert_eq!(decoded.lecture_id, lecture_id);
            assert_eq!(decoded.to_string(), code);
        }
    }

    #[test]
    fn test_lecture_id_from_code() {
        assert_eq!(lecture_id_from_code("rm1-l42").as_deref(), Some("l42"));
        assert_eq!(lecture_id_from_code("nonsense"), None);
    }

    #[test]
    fn test_referral_url() {
        assert_eq!(
            referral_url("http://localhost:3000", "rm7", "l99").unwrap(),
            "http://localhost:3000/signup?ref=rm7-l99"
        );
        assert_eq!(
            referral_url("https://lectures.example.com/", "rm7", "l99").unwrap(),
            "https://lectures.example.com/signup?ref=rm7-l99"
        );
    }
}
