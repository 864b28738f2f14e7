//! Service status commands

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::client::{ApiClient, ModelInfo};
use crate::output::{color_status, print_info, print_json, print_table, OutputFormat};

/// Row for parental levels table
#[derive(Tabled, Serialize)]
struct LevelRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Parental Education Level")]
    level: String,
}

/// Row for loaded models table
#[derive(Tabled, Serialize)]
struct ModelRow {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Features")]
    features: usize,
    #[tabled(rename = "Artifact")]
    artifact: String,
}

impl ModelRow {
    fn new(role: &str, info: ModelInfo) -> Self {
        Self {
            role: role.to_string(),
            kind: info.kind,
            version: info.version,
            features: info.feature_count,
            artifact: info.path.unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// List the parental education levels the service accepts
pub async fn list_levels(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let levels = client.parental_levels().await?;

    let rows: Vec<LevelRow> = levels
        .into_iter()
        .enumerate()
        .map(|(i, level)| LevelRow {
            index: i + 1,
            level,
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}

/// Show service health and the loaded models
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    if format == OutputFormat::Json {
        print_json(&health);
        return Ok(());
    }

    print_info(&format!("Service status: {}", color_status(&health.status)));
    let rows = vec![
        ModelRow::new("score", health.score_model),
        ModelRow::new("outcome", health.outcome_model),
    ];
    print_table(&rows, format);
    Ok(())
}
