//! Feature schema derivation
//!
//! A schema is the ordered column list a model was trained against. The
//! regression model's list is authoritative: it defines the parental
//! education levels, and the classifier's list must be an
//! order-preserving subset of it.

use crate::error::{PredictorError, Result};
use std::collections::HashSet;

pub const GENDER: &str = "Gender";
pub const INTERNET_ACCESS: &str = "Internet_Access_at_Home";
pub const EXTRACURRICULAR: &str = "Extracurricular_Activities";
pub const STUDY_HOURS: &str = "Study_Hours_per_Week";
pub const ATTENDANCE_RATE: &str = "Attendance_Rate";
pub const PAST_EXAM_SCORES: &str = "Past_Exam_Scores";

/// Prefix shared by the one-hot parental education columns
pub const PARENTAL_LEVEL_PREFIX: &str = "Parental_Education_Level_";

/// What a single column encodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Gender,
    InternetAccess,
    Extracurricular,
    StudyHours,
    AttendanceRate,
    PastExamScores,
    /// One-hot column for the contained level label
    ParentalLevel(String),
}

impl Column {
    fn parse(name: &str) -> Result<Self> {
        let column = match name {
            GENDER => Self::Gender,
            INTERNET_ACCESS => Self::InternetAccess,
            EXTRACURRICULAR => Self::Extracurricular,
            STUDY_HOURS => Self::StudyHours,
            ATTENDANCE_RATE => Self::AttendanceRate,
            PAST_EXAM_SCORES => Self::PastExamScores,
            other => match other.strip_prefix(PARENTAL_LEVEL_PREFIX) {
                Some("") => {
                    return Err(PredictorError::schema(format!(
                        "one-hot column '{}' has no level suffix",
                        other
                    )))
                }
                Some(level) => Self::ParentalLevel(level.to_string()),
                None => {
                    return Err(PredictorError::schema(format!(
                        "unrecognized feature column '{}'",
                        other
                    )))
                }
            },
        };
        Ok(column)
    }

    pub fn is_one_hot(&self) -> bool {
        matches!(self, Self::ParentalLevel(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Self::Gender | Self::InternetAccess | Self::Extracurricular
        )
    }

    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::StudyHours | Self::AttendanceRate | Self::PastExamScores
        )
    }
}

/// Ordered, classified column list for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl FeatureSchema {
    /// Classify every column of a feature list, keeping its order
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(PredictorError::schema("feature list is empty"));
        }

        let mut seen = HashSet::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(PredictorError::schema(format!(
                    "duplicate feature column '{}'",
                    name
                )));
            }
            columns.push(Column::parse(name)?);
        }

        Ok(Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            columns,
        })
    }

    /// Derive the regression schema, which must carry the one-hot group
    pub fn derive<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let schema = Self::parse(names)?;
        if !schema.columns.iter().any(Column::is_one_hot) {
            return Err(PredictorError::schema(format!(
                "no '{}*' one-hot columns found",
                PARENTAL_LEVEL_PREFIX
            )));
        }
        Ok(schema)
    }

    /// Derive a schema that must be an order-preserving subset of `self`
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let schema = Self::parse(names)?;
        schema.ensure_subset_of(self)?;
        Ok(schema)
    }

    /// Check that every column of `self` appears in `parent`, in the same
    /// relative order
    pub fn ensure_subset_of(&self, parent: &FeatureSchema) -> Result<()> {
        let mut last_position: Option<usize> = None;
        for name in &self.names {
            let position = parent.position(name).ok_or_else(|| {
                PredictorError::schema(format!(
                    "column '{}' is missing from the regression schema",
                    name
                ))
            })?;
            if last_position.is_some_and(|last| position < last) {
                return Err(PredictorError::schema(format!(
                    "column '{}' is out of order relative to the regression schema",
                    name
                )));
            }
            last_position = Some(position);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Parental education levels in column order
    pub fn parental_levels(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                Column::ParentalLevel(level) => Some(level.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn regression_columns() -> Vec<&'static str> {
        vec![
            GENDER,
            INTERNET_ACCESS,
            EXTRACURRICULAR,
            STUDY_HOURS,
            ATTENDANCE_RATE,
            PAST_EXAM_SCORES,
            "Parental_Education_Level_Bachelors",
            "Parental_Education_Level_High School",
            "Parental_Education_Level_Masters",
            "Parental_Education_Level_PhD",
        ]
    }

    #[test]
    fn test_derive_partitions_columns() {
        let schema = FeatureSchema::derive(&regression_columns()).unwrap();
        assert_eq!(schema.len(), 10);

        let binary = schema.columns().iter().filter(|c| c.is_binary()).count();
        let continuous = schema.columns().iter().filter(|c| c.is_continuous()).count();
        let one_hot = schema.columns().iter().filter(|c| c.is_one_hot()).count();
        assert_eq!((binary, continuous, one_hot), (3, 3, 4));

        assert_eq!(
            schema.parental_levels(),
            vec!["Bachelors", "High School", "Masters", "PhD"]
        );
    }

    #[test]
    fn test_derive_requires_one_hot_group() {
        let names = vec![GENDER, STUDY_HOURS, PAST_EXAM_SCORES];
        let err = FeatureSchema::derive(&names).unwrap_err();
        assert!(matches!(err, PredictorError::Schema(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_and_duplicate_columns() {
        assert!(FeatureSchema::parse(&["Gender", "Shoe_Size"]).is_err());
        assert!(FeatureSchema::parse(&["Gender", "Gender"]).is_err());
        assert!(FeatureSchema::parse(&["Parental_Education_Level_"]).is_err());
        assert!(FeatureSchema::parse::<&str>(&[]).is_err());
    }

    #[test]
    fn test_subset_keeps_relative_order() {
        let regression = FeatureSchema::derive(&regression_columns()).unwrap();
        let classifier = regression
            .subset(&[
                INTERNET_ACCESS,
                STUDY_HOURS,
                PAST_EXAM_SCORES,
                "Parental_Education_Level_PhD",
            ])
            .unwrap();
        assert_eq!(classifier.len(), 4);
        assert!(classifier.parental_levels() == vec!["PhD"]);
    }

    #[test]
    fn test_subset_rejects_reordered_columns() {
        let regression = FeatureSchema::derive(&regression_columns()).unwrap();
        let err = regression
            .subset(&[PAST_EXAM_SCORES, STUDY_HOURS])
            .unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_subset_rejects_foreign_columns() {
        let regression = FeatureSchema::derive(&[
            STUDY_HOURS,
            "Parental_Education_Level_Bachelors",
        ])
        .unwrap();
        let err = regression
            .subset(&[STUDY_HOURS, "Parental_Education_Level_PhD"])
            .unwrap_err();
        assert!(err.to_string().contains("missing from the regression schema"));
    }
}
