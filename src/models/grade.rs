//! Recall quality on the SM-2 0-5 scale, and the three buttons the quiz screen offers.
use crate::error::ReviewError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grades at or above this value count as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

/// Validated quality score in `0..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Rejects anything above 5 instead of clamping.
    pub fn new(value: u8) -> Result<Self, ReviewError> {
        if value > Self::MAX {
            return Err(ReviewError::InvalidGrade { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_passing(self) -> bool {
        self.0 >= PASSING_QUALITY
    }
}

impl TryFrom<u8> for Quality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// The grade buttons shown after the judge has answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    Fail,
    Hard,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 3] = [Grade::Fail, Grade::Hard, Grade::Easy];

    pub fn quality(self) -> Quality {
        match self {
            Grade::Fail => Quality(0),
            Grade::Hard => Quality(3),
            Grade::Easy => Quality(5),
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            Grade::Fail => "Fout",
            Grade::Hard => "Twijfel",
            Grade::Easy => "Goed",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|grade| grade.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl From<Grade> for Quality {
    fn from(grade: Grade) -> Self {
        grade.quality()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_accepts_full_range() {
        for value in 0..=5 {
            assert_eq!(Quality::new(value).unwrap().value(), value);
        }
    }

    #[test]
    fn test_quality_rejects_out_of_range() {
        let err = Quality::new(6).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidGrade { value: 6 }));
    }

    #[test]
    fn test_grade_mapping() {
        assert_eq!(Grade::Fail.quality().value(), 0);
        assert_eq!(Grade::Hard.quality().value(), 3);
        assert_eq!(Grade::Easy.quality().value(), 5);
        assert!(!Grade::Fail.quality().is_passing());
        assert!(Grade::Hard.quality().is_passing());
    }

    #[test]
    fn test_grade_from_label() {
        assert_eq!(Grade::from_label("Twijfel"), Some(Grade::Hard));
        assert_eq!(Grade::from_label(" goed "), Some(Grade::Easy));
        assert_eq!(Grade::from_label("misschien"), None);
    }

    #[test]
    fn test_quality_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Quality>("4").is_ok());
        assert!(serde_json::from_str::<Quality>("9").is_err());
    }
}
