//! Feature vector assembly
//!
//! Maps a [`RawInput`] into the positional row a model consumes. Models see
//! only the numbers, so the row keeps a handle to the schema it was built
//! against and predictors compare that schema with their own before every
//! call.

use crate::error::{Result, ValidationError};
use crate::models::{Gender, RawInput, YesNo};
use crate::schema::{Column, FeatureSchema};
use std::sync::Arc;

/// Inclusive bounds for every continuous input
pub const NUMERIC_MIN: f64 = 0.0;
pub const NUMERIC_MAX: f64 = 100.0;

/// Numeric row in schema column order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema: Arc<FeatureSchema>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column, if the schema has it
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    /// Recover the categorical answers encoded in this row
    ///
    /// Fields whose columns are absent from the schema come back as `None`.
    /// The parental level is `None` when no one-hot column is set.
    pub fn decode(&self) -> CategoricalChoices {
        let mut choices = CategoricalChoices::default();
        for (column, value) in self.schema.columns().iter().zip(&self.values) {
            let set = *value == 1.0;
            match column {
                Column::Gender => {
                    choices.gender = Some(if set { Gender::Female } else { Gender::Male });
                }
                Column::InternetAccess => choices.internet_access = Some(YesNo::from(set)),
                Column::Extracurricular => choices.extracurricular = Some(YesNo::from(set)),
                Column::ParentalLevel(level) if set => {
                    choices.parental_education_level = Some(level.clone());
                }
                _ => {}
            }
        }
        choices
    }
}

/// Categorical fields recovered from a [`FeatureVector`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalChoices {
    pub gender: Option<Gender>,
    pub internet_access: Option<YesNo>,
    pub extracurricular: Option<YesNo>,
    pub parental_education_level: Option<String>,
}

/// Builds feature vectors against any schema derived from the regression
/// schema
///
/// Validation runs against the full set of parental levels, so a request
/// is rejected the same way whichever model it targets.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    parental_levels: Vec<String>,
}

impl FeatureBuilder {
    pub fn new(regression_schema: &FeatureSchema) -> Self {
        Self {
            parental_levels: regression_schema.parental_levels(),
        }
    }

    pub fn parental_levels(&self) -> &[String] {
        &self.parental_levels
    }

    /// Reject out-of-range numbers and unknown parental levels
    pub fn validate(&self, input: &RawInput) -> Result<()> {
        check_range("study_hours", input.study_hours)?;
        check_range("attendance_rate", input.attendance_rate)?;
        check_range("past_exam_score", input.past_exam_score)?;

        if !self
            .parental_levels
            .iter()
            .any(|l| *l == input.parental_education_level)
        {
            return Err(ValidationError::UnknownParentalLevel {
                level: input.parental_education_level.clone(),
                known: self.parental_levels.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Validate `input` and lay it out in `schema` order
    pub fn build(&self, input: &RawInput, schema: &Arc<FeatureSchema>) -> Result<FeatureVector> {
        self.validate(input)?;

        let values = schema
            .columns()
            .iter()
            .map(|column| column_value(column, input))
            .collect();

        Ok(FeatureVector {
            schema: Arc::clone(schema),
            values,
        })
    }
}

fn check_range(field: &'static str, value: f64) -> std::result::Result<(), ValidationError> {
    // NaN fails the range test as well
    if (NUMERIC_MIN..=NUMERIC_MAX).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: NUMERIC_MIN,
            max: NUMERIC_MAX,
        })
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn column_value(column: &Column, input: &RawInput) -> f64 {
    match column {
        Column::Gender => indicator(input.gender == Gender::Female),
        Column::InternetAccess => indicator(input.internet_access.is_yes()),
        Column::Extracurricular => indicator(input.extracurricular.is_yes()),
        Column::StudyHours => input.study_hours,
        Column::AttendanceRate => input.attendance_rate,
        Column::PastExamScores => input.past_exam_score,
        Column::ParentalLevel(level) => indicator(*level == input.parental_education_level),
    }
}
