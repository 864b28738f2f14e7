//! Prediction commands

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use crate::client::{ApiClient, StudentRecord};
use crate::output::{
    color_grade, color_outcome, format_probability, print_json, print_success, print_table,
    OutputFormat,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GenderArg {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum YesNoArg {
    Yes,
    No,
}

/// Student record supplied on the command line
#[derive(Debug, Clone, Args)]
pub struct StudentArgs {
    /// Student gender
    #[arg(long, value_enum)]
    pub gender: GenderArg,

    /// Whether the student has internet access at home
    #[arg(long, value_enum)]
    pub internet_access: YesNoArg,

    /// Whether the student takes part in extracurricular activities
    #[arg(long, value_enum)]
    pub extracurricular: YesNoArg,

    /// Weekly study hours (0-100)
    #[arg(long)]
    pub study_hours: f64,

    /// Attendance rate in percent (0-100)
    #[arg(long)]
    pub attendance_rate: f64,

    /// Previous exam score (0-100)
    #[arg(long)]
    pub past_exam_score: f64,

    /// Highest education level of the parents (see `spctl levels`)
    #[arg(long)]
    pub parental_level: String,
}

impl From<StudentArgs> for StudentRecord {
    fn from(args: StudentArgs) -> Self {
        let yes_no = |v: YesNoArg| match v {
            YesNoArg::Yes => "yes".to_string(),
            YesNoArg::No => "no".to_string(),
        };
        Self {
            gender: match args.gender {
                GenderArg::Male => "male".to_string(),
                GenderArg::Female => "female".to_string(),
            },
            internet_access: yes_no(args.internet_access),
            extracurricular: yes_no(args.extracurricular),
            study_hours: args.study_hours,
            attendance_rate: args.attendance_rate,
            past_exam_score: args.past_exam_score,
            parental_education_level: args.parental_level,
        }
    }
}

/// Row for score prediction table
#[derive(Tabled, Serialize)]
struct ScoreRow {
    #[tabled(rename = "Score")]
    score: i32,
    #[tabled(rename = "Grade")]
    grade: String,
    #[tabled(rename = "Model")]
    model_version: String,
}

/// Row for outcome prediction table
#[derive(Tabled, Serialize)]
struct OutcomeRow {
    #[tabled(rename = "Outcome")]
    label: String,
    #[tabled(rename = "P(Pass)")]
    pass_probability: String,
    #[tabled(rename = "P(Fail)")]
    fail_probability: String,
    #[tabled(rename = "Model")]
    model_version: String,
}

/// Predict the exam score and letter grade
pub async fn predict_score(
    client: &ApiClient,
    student: StudentArgs,
    format: OutputFormat,
) -> Result<()> {
    let prediction = client.predict_score(&student.into()).await?;

    if format == OutputFormat::Json {
        print_json(&prediction);
        return Ok(());
    }

    let rows = vec![ScoreRow {
        score: prediction.score,
        grade: color_grade(&prediction.grade),
        model_version: prediction.model_version,
    }];
    print_table(&rows, format);
    print_success(&format!(
        "Predicted at {}",
        prediction.predicted_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}

/// Predict pass/fail with class probabilities
pub async fn predict_outcome(
    client: &ApiClient,
    student: StudentArgs,
    format: OutputFormat,
) -> Result<()> {
    let prediction = client.predict_outcome(&student.into()).await?;

    if format == OutputFormat::Json {
        print_json(&prediction);
        return Ok(());
    }

    let rows = vec![OutcomeRow {
        label: color_outcome(&prediction.label),
        pass_probability: format_probability(prediction.pass_probability),
        fail_probability: format_probability(prediction.fail_probability),
        model_version: prediction.model_version,
    }];
    print_table(&rows, format);
    print_success(&format!(
        "Predicted at {}",
        prediction.predicted_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_args_to_record() {
        let args = StudentArgs {
            gender: GenderArg::Female,
            internet_access: YesNoArg::No,
            extracurricular: YesNoArg::Yes,
            study_hours: 12.5,
            attendance_rate: 88.0,
            past_exam_score: 61.0,
            parental_level: "High School".to_string(),
        };

        let record = StudentRecord::from(args);
        assert_eq!(record.gender, "female");
        assert_eq!(record.internet_access, "no");
        assert_eq!(record.extracurricular, "yes");
        assert_eq!(record.study_hours, 12.5);
        assert_eq!(record.parental_education_level, "High School");
    }
}
