//! Profile data model.
//!
//! On chain, a profile is stored under `profiles/<address>` as a JSON
//! array of exactly two strings, username first. Anything else under
//! that key is treated as foreign data and surfaces as a
//! [`DecodeError`] instead of poisoning the session.

use serde_json::{json, Value};
use thiserror::Error;

use crate::error::Error;

/// A profile as stored on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub bio: String,
}

/// What the dashboard knows about the active identity's profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProfileState {
    /// No read has completed yet.
    #[default]
    Unloaded,
    /// A read completed and found nothing.
    Absent,
    /// A read completed and found this profile.
    Stored(Profile),
}

/// An editable profile before submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub username: String,
    pub bio: String,
}

impl Draft {
    /// Checks that both fields carry something besides whitespace.
    /// Fields are submitted as typed; only the check trims.
    pub fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty() {
            return Err(Error::Validation { field: "username" });
        }
        if self.bio.trim().is_empty() {
            return Err(Error::Validation { field: "bio" });
        }
        Ok(())
    }
}

/// Seeds an editor with the stored profile.
impl From<&Profile> for Draft {
    fn from(profile: &Profile) -> Self {
        Draft {
            username: profile.username.clone(),
            bio: profile.bio.clone(),
        }
    }
}

/// Outcome of decoding one storage read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileRecord {
    Found(Profile),
    Absent,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record is not valid JSON")]
    NotJson,

    #[error("record is not a two-string array")]
    WrongShape,
}

/// Storage key of the profile record for `address`.
pub fn storage_key(address: &str) -> String {
    format!("profiles/{address}")
}

/// Decodes a raw storage read. A missing or empty record is a normal
/// [`ProfileRecord::Absent`], never an error.
pub fn decode_record(raw: Option<&[u8]>) -> Result<ProfileRecord, DecodeError> {
    let Some(bytes) = raw.filter(|bytes| !bytes.is_empty()) else {
        return Ok(ProfileRecord::Absent);
    };
    let value: Value = serde_json::from_slice(bytes).map_err(|_| DecodeError::NotJson)?;
    match value.as_array().map(Vec::as_slice) {
        Some([Value::String(username), Value::String(bio)]) => Ok(ProfileRecord::Found(Profile {
            username: username.clone(),
            bio: bio.clone(),
        })),
        _ => Err(DecodeError::WrongShape),
    }
}

/// Encodes a profile the way [`decode_record`] expects it back.
pub fn encode_record(profile: &Profile) -> Vec<u8> {
    json!([profile.username, profile.bio]).to_string().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_empty_records_are_absent() {
        assert_eq!(decode_record(None).unwrap(), ProfileRecord::Absent);
        assert_eq!(decode_record(Some(b"".as_slice())).unwrap(), ProfileRecord::Absent);
    }

    #[test]
    fn well_formed_record_decodes() {
        let raw = br#"["alice","Rust since the ice age"]"#;
        let record = decode_record(Some(raw.as_slice())).unwrap();
        assert_eq!(
            record,
            ProfileRecord::Found(Profile {
                username: "alice".to_string(),
                bio: "Rust since the ice age".to_string(),
            })
        );
    }

    #[test]
    fn encoded_profile_decodes_back() {
        let profile = Profile {
            username: "bob".to_string(),
            bio: "hello".to_string(),
        };
        let raw = encode_record(&profile);
        assert_eq!(
            decode_record(Some(&raw)).unwrap(),
            ProfileRecord::Found(profile)
        );
    }

    #[test]
    fn foreign_records_are_rejected() {
        let not_json = decode_record(Some(b"not json".as_slice()));
        assert_eq!(not_json.unwrap_err(), DecodeError::NotJson);

        for raw in [
            br#"["alice"]"#.as_slice(),
            br#"["a","b","c"]"#.as_slice(),
            br#"[1,2]"#.as_slice(),
            br#"{"username":"alice","bio":"hi"}"#.as_slice(),
            br#""alice""#.as_slice(),
        ] {
            assert_eq!(decode_record(Some(raw)).unwrap_err(), DecodeError::WrongShape);
        }
    }

    #[test]
    fn blank_fields_fail_validation() {
        let draft = Draft {
            username: String::new(),
            bio: "present".to_string(),
        };
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "username" })
        ));

        let draft = Draft {
            username: "alice".to_string(),
            bio: "   ".to_string(),
        };
        assert!(matches!(
            draft.validate(),
            Err(Error::Validation { field: "bio" })
        ));

        let draft = Draft {
            username: "alice".to_string(),
            bio: "hi".to_string(),
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn draft_seeds_from_stored_profile() {
        let profile = Profile {
            username: "alice".to_string(),
            bio: "hi".to_string(),
        };
        let draft = Draft::from(&profile);
        assert_eq!(draft.username, "alice");
        assert_eq!(draft.bio, "hi");
    }
}
