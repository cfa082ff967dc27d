//! H264 `profile-level-id` handling as described in RFC 6184, used by strict codec matching.
//!
//! A `profile-level-id` is three bytes in hex: `profile_idc`, `profile-iop` (constraint flags)
//! and `level_idc`. Two H264 codecs are only compatible if they share the same profile, and
//! the level of an answer depends on whether both sides allow level asymmetry.


use crate::rtp_parameters::CodecParameters;
use std::str::FromStr;
use thiserror::Error;

/// Profile used when `profile-level-id` parameter is absent (RFC 6184 default, `42e01f`).
pub const DEFAULT_PROFILE_LEVEL_ID: ProfileLevelId = ProfileLevelId {
    profile: Profile::ConstrainedBaseline,
    level: Level::L3_1,
};

// constraint_set3_flag, signals level 1b together with level_idc 11.
const CONSTRAINT_SET3_FLAG: u8 = 0x10;

/// H264 profile.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Profile {
    /// Constrained Baseline
    ConstrainedBaseline,
    /// Baseline
    Baseline,
    /// Main
    Main,
    /// Constrained High
    ConstrainedHigh,
    /// High
    High,
    /// Predictive High 4:4:4
    PredictiveHigh444,
}

/// H264 level, the value is `level_idc` except for level 1b.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum Level {
    /// 1b
    L1b = 0,
    /// 1
    L1 = 10,
    /// 1.1
    L1_1 = 11,
    /// 1.2
    L1_2 = 12,
    /// 1.3
    L1_3 = 13,
    /// 2
    L2 = 20,
    /// 2.1
    L2_1 = 21,
    /// 2.2
    L2_2 = 22,
    /// 3
    L3 = 30,
    /// 3.1
    L3_1 = 31,
    /// 3.2
    L3_2 = 32,
    /// 4
    L4 = 40,
    /// 4.1
    L4_1 = 41,
    /// 4.2
    L4_2 = 42,
    /// 5
    L5 = 50,
    /// 5.1
    L5_1 = 51,
    /// 5.2
    L5_2 = 52,
}

impl Level {
    fn from_level_idc(level_idc: u8) -> Option<Self> {
        Some(match level_idc {
            10 => Self::L1,
            11 => Self::L1_1,
            12 => Self::L1_2,
            13 => Self::L1_3,
            20 => Self::L2,
            21 => Self::L2_1,
            22 => Self::L2_2,
            30 => Self::L3,
            31 => Self::L3_1,
            32 => Self::L3_2,
            40 => Self::L4,
            41 => Self::L4_1,
            42 => Self::L4_2,
            50 => Self::L5,
            51 => Self::L5_1,
            52 => Self::L5_2,
            _ => return None,
        })
    }

    /// Whether `self` is a lower level than `other`; 1b sits between 1 and 1.1.
    #[must_use]
    pub fn is_less_than(self, other: Self) -> bool {
        match (self, other) {
            (Self::L1b, other) => other != Self::L1 && other != Self::L1b,
            (this, Self::L1b) => this == Self::L1,
            (this, other) => (this as u8) < (other as u8),
        }
    }

    /// The lower of two levels.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.is_less_than(other) {
            self
        } else {
            other
        }
    }
}

/// Errors of `profile-level-id` parsing and answer generation.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ProfileLevelIdError {
    /// Malformed `profile-level-id` value.
    #[error("invalid profile-level-id {0:?}")]
    Invalid(String),
    /// Local and remote sides use different profiles.
    #[error("H264 profile mismatch [local:{local:?}, remote:{remote:?}]")]
    ProfileMismatch {
        /// Local profile
        local: Profile,
        /// Remote profile
        remote: Profile,
    },
    /// Level 1b can't be expressed for given profile.
    #[error("level 1b is not supported for profile {0:?}")]
    Level1bUnsupported(Profile),
}

struct ProfilePattern {
    profile_idc: u8,
    mask: u8,
    masked_value: u8,
    profile: Profile,
}

impl ProfilePattern {
    /// Pattern is 8 characters of `0`, `1` or `x` (don't care), most significant bit first.
    const fn new(profile_idc: u8, pattern: &str, profile: Profile) -> Self {
        let bytes = pattern.as_bytes();
        let mut mask = 0_u8;
        let mut masked_value = 0_u8;
        let mut i = 0;
        while i < 8 {
            let bit = 1_u8 << (7 - i);
            match bytes[i] {
                b'x' => {}
                b'1' => {
                    mask |= bit;
                    masked_value |= bit;
                }
                _ => {
                    mask |= bit;
                }
            }
            i += 1;
        }

        Self {
            profile_idc,
            mask,
            masked_value,
            profile,
        }
    }

    fn matches(&self, profile_idc: u8, profile_iop: u8) -> bool {
        self.profile_idc == profile_idc && profile_iop & self.mask == self.masked_value
    }
}

const PROFILE_PATTERNS: [ProfilePattern; 9] = [
    ProfilePattern::new(0x42, "x1xx0000", Profile::ConstrainedBaseline),
    ProfilePattern::new(0x4d, "1xxx0000", Profile::ConstrainedBaseline),
    ProfilePattern::new(0x58, "11xx0000", Profile::ConstrainedBaseline),
    ProfilePattern::new(0x42, "x0xx0000", Profile::Baseline),
    ProfilePattern::new(0x58, "10xx0000", Profile::Baseline),
    ProfilePattern::new(0x4d, "0x0x0000", Profile::Main),
    ProfilePattern::new(0x64, "00000000", Profile::High),
    ProfilePattern::new(0x64, "00001100", Profile::ConstrainedHigh),
    ProfilePattern::new(0xf4, "00000000", Profile::PredictiveHigh444),
];

/// Parsed `profile-level-id`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProfileLevelId {
    /// H264 profile.
    pub profile: Profile,
    /// H264 level.
    pub level: Level,
}

impl ProfileLevelId {
    /// Create new instance.
    #[must_use]
    pub fn new(profile: Profile, level: Level) -> Self {
        Self { profile, level }
    }

    /// Serialize into the 6 hex characters form used in SDP/ORTC codec parameters.
    ///
    /// Returns `Err()` for level 1b with a profile that can't signal it.
    pub fn to_sdp_string(&self) -> Result<String, ProfileLevelIdError> {
        if self.level == Level::L1b {
            return match self.profile {
                Profile::ConstrainedBaseline => Ok("42f00b".to_string()),
                Profile::Baseline => Ok("42100b".to_string()),
                Profile::Main => Ok("4d100b".to_string()),
                profile => Err(ProfileLevelIdError::Level1bUnsupported(profile)),
            };
        }

        let profile_idc_iop = match self.profile {
            Profile::ConstrainedBaseline => "42e0",
            Profile::Baseline => "4200",
            Profile::Main => "4d00",
            Profile::ConstrainedHigh => "640c",
            Profile::High => "6400",
            Profile::PredictiveHigh444 => "f400",
        };

        Ok(format!("{}{:02x}", profile_idc_iop, self.level as u8))
    }
}

impl FromStr for ProfileLevelId {
    type Err = ProfileLevelIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProfileLevelIdError::Invalid(s.to_string());

        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let numeric = u32::from_str_radix(s, 16).map_err(|_| invalid())?;

        let [_, profile_idc, profile_iop, level_idc] = numeric.to_be_bytes();

        let level = if level_idc == Level::L1_1 as u8 && profile_iop & CONSTRAINT_SET3_FLAG != 0 {
            Level::L1b
        } else {
            Level::from_level_idc(level_idc).ok_or_else(invalid)?
        };

        PROFILE_PATTERNS
            .iter()
            .find(|pattern| pattern.matches(profile_idc, profile_iop))
            .map(|pattern| Self::new(pattern.profile, level))
            .ok_or_else(invalid)
    }
}

/// Parse `profile-level-id` out of codec parameters, falling back to
/// [`DEFAULT_PROFILE_LEVEL_ID`] when absent.
pub fn parse_sdp_profile_level_id(
    parameters: &CodecParameters,
) -> Result<ProfileLevelId, ProfileLevelIdError> {
    match parameters.get("profile-level-id") {
        Some(value) => value.to_string().parse(),
        None => Ok(DEFAULT_PROFILE_LEVEL_ID),
    }
}

/// Whether both parameter sets use the same H264 profile.
#[must_use]
pub fn is_same_profile(parameters_a: &CodecParameters, parameters_b: &CodecParameters) -> bool {
    match (
        parse_sdp_profile_level_id(parameters_a),
        parse_sdp_profile_level_id(parameters_b),
    ) {
        (Ok(profile_level_id_a), Ok(profile_level_id_b)) => {
            profile_level_id_a.profile == profile_level_id_b.profile
        }
        _ => false,
    }
}

fn is_level_asymmetry_allowed(parameters: &CodecParameters) -> bool {
    parameters.get_number("level-asymmetry-allowed") == Some(1)
}

/// Generate `profile-level-id` to use in an answer, given local supported parameters and
/// remote offered parameters.
///
/// Returns `Ok(None)` if neither side specifies `profile-level-id` (meaning the answer should
/// omit it too) and `Err()` if profiles are incompatible.
pub fn generate_profile_level_id_for_answer(
    local_supported_parameters: &CodecParameters,
    remote_offered_parameters: &CodecParameters,
) -> Result<Option<String>, ProfileLevelIdError> {
    if !local_supported_parameters.contains_key("profile-level-id")
        && !remote_offered_parameters.contains_key("profile-level-id")
    {
        return Ok(None);
    }

    let local_profile_level_id = parse_sdp_profile_level_id(local_supported_parameters)?;
    let remote_profile_level_id = parse_sdp_profile_level_id(remote_offered_parameters)?;

    if local_profile_level_id.profile != remote_profile_level_id.profile {
        return Err(ProfileLevelIdError::ProfileMismatch {
            local: local_profile_level_id.profile,
            remote: remote_profile_level_id.profile,
        });
    }

    let level_asymmetry_allowed = is_level_asymmetry_allowed(local_supported_parameters)
        && is_level_asymmetry_allowed(remote_offered_parameters);

    // Without level asymmetry the answer must not upgrade the level of the offer.
    let answer_level = if level_asymmetry_allowed {
        local_profile_level_id.level
    } else {
        local_profile_level_id
            .level
            .min(remote_profile_level_id.level)
    };

    ProfileLevelId::new(local_profile_level_id.profile, answer_level)
        .to_sdp_string()
        .map(Some)
}
