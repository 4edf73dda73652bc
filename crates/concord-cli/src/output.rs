//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use concord_classifier::HealthStatus;
use concord_domain::assembler::{DEMOGRAPHIC_FEATURES, RELATIONAL_FEATURES};
use concord_domain::layout::{DEMOGRAPHIC_LEN, RELATIONAL_LEN};
use concord_domain::{AccessId, ClassificationRequest, RiskLevel, Verdict};
use concord_pipeline::BatchReport;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one couple's verdict.
    pub fn format_verdict(&self, access_id: &AccessId, verdict: &Verdict) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(verdict)?),
            OutputFormat::Table => Ok(self.format_verdict_table(access_id, verdict)),
        }
    }

    fn format_verdict_table(&self, access_id: &AccessId, verdict: &Verdict) -> String {
        let mut lines = vec![
            format!(
                "Couple {}: {} risk (confidence {:.0}%, {})",
                access_id,
                self.risk(verdict.risk_level),
                verdict.confidence * 100.0,
                verdict.method
            ),
            String::new(),
        ];

        if !verdict.focus_categories.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Category", "Score", "Priority"]);
            for focus in &verdict.focus_categories {
                builder.push_record([
                    focus.name.clone(),
                    format!("{:.2}", focus.score),
                    focus.priority.as_str().to_string(),
                ]);
            }
            lines.push(table(builder));
        }

        for reasoning in [&verdict.risk_reasoning, &verdict.counseling_reasoning]
            .into_iter()
            .flatten()
        {
            lines.push(String::new());
            lines.push(reasoning.clone());
        }

        if !verdict.recommendations.is_empty() {
            lines.push(String::new());
            lines.push("Recommendations:".to_string());
            for (i, rec) in verdict.recommendations.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, rec));
            }
        }

        lines.join("\n")
    }

    /// Format a feature vector, or the whole request when `full` is set.
    pub fn format_request(&self, request: &ClassificationRequest, full: bool) -> Result<String> {
        if full || self.format == OutputFormat::Json {
            return Ok(if full {
                serde_json::to_string_pretty(request)?
            } else {
                serde_json::to_string_pretty(&request.feature_vector)?
            });
        }

        let vector = &request.feature_vector;
        let mut builder = Builder::default();
        builder.push_record(["#", "Block", "Feature", "Value"]);

        for (i, (name, value)) in DEMOGRAPHIC_FEATURES
            .iter()
            .zip(vector.demographic_block())
            .enumerate()
        {
            builder.push_record([i.to_string(), "demographic".into(), name.to_string(), fmt(*value)]);
        }

        let offset = DEMOGRAPHIC_LEN;
        for (i, value) in vector.response_block().iter().enumerate() {
            builder.push_record([
                (offset + i).to_string(),
                "response".into(),
                format!("q{}", i + 1),
                fmt(*value),
            ]);
        }

        let offset = vector.len() - RELATIONAL_LEN;
        for (i, (name, value)) in RELATIONAL_FEATURES
            .iter()
            .zip(vector.relational_block())
            .enumerate()
        {
            builder.push_record([
                (offset + i).to_string(),
                "relational".into(),
                name.to_string(),
                fmt(*value),
            ]);
        }

        Ok(format!(
            "Couple {} ({} & {}): {} features\n{}",
            request.context.couple_id,
            request.context.male_name,
            request.context.female_name,
            vector.len(),
            table(builder)
        ))
    }

    /// Format a batch report.
    pub fn format_report(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "total": report.total,
                "success": report.success,
                "failed": report.failed,
                "skipped": report.skipped,
                "retryable": report.retryable,
                "messages": report.messages,
            }))?),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Total", "Success", "Failed", "Skipped", "Low", "Medium", "High"]);
                builder.push_record([
                    report.total.to_string(),
                    report.success.to_string(),
                    report.failed.to_string(),
                    report.skipped.to_string(),
                    report.risk_count(RiskLevel::Low).to_string(),
                    report.risk_count(RiskLevel::Medium).to_string(),
                    report.risk_count(RiskLevel::High).to_string(),
                ]);

                let mut out = table(builder);
                for message in &report.messages {
                    out.push('\n');
                    out.push_str(&self.warning(message));
                }
                Ok(out)
            }
        }
    }

    /// Format a health probe result.
    pub fn format_health(&self, endpoint: &str, health: &HealthStatus) -> String {
        let version = health
            .version
            .as_deref()
            .map(|v| format!(" v{}", v))
            .unwrap_or_default();
        let msg = format!("Classifier at {} is {}{}", endpoint, health.status, version);
        if health.is_healthy() {
            self.success(&msg)
        } else {
            self.warning(&msg)
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn risk(&self, level: RiskLevel) -> String {
        let color = match level {
            RiskLevel::Low => "green",
            RiskLevel::Medium => "yellow",
            RiskLevel::High => "red",
        };
        self.colorize(level.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().bold().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn table(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn fmt(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.4}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_classifier::MockClassifier;
    use concord_domain::{
        Demographics, FeatureAssembler, RelationalFeatures, RequestContext, RespondentProfile,
        RespondentSequences,
    };

    fn request() -> ClassificationRequest {
        let assembler = FeatureAssembler::default();
        let demographics =
            Demographics::from_profiles(&RespondentProfile::default(), &RespondentProfile::default());
        let relational = RelationalFeatures::compute(&[], &[], &[], assembler.layout());
        ClassificationRequest {
            feature_vector: assembler.assemble(
                &demographics,
                &RespondentSequences::default(),
                &relational,
            ),
            context: RequestContext {
                couple_id: AccessId::from("c1"),
                male_name: "Juan".to_string(),
                female_name: "Maria".to_string(),
                demographics,
                male_responses: vec![],
                female_responses: vec![],
                questionnaire_responses: vec![3; 59],
                personalized_features: relational,
                category_map_version: "v1".to_string(),
            },
        }
    }

    #[test]
    fn test_verdict_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut verdict = MockClassifier::verdict(RiskLevel::High);
        verdict.recommendations = vec!["Attend counseling".to_string()];
        verdict.risk_reasoning = Some("High risk assessment based on: test".to_string());

        let output = formatter
            .format_verdict(&AccessId::from("c1"), &verdict)
            .unwrap();
        assert!(output.starts_with("Couple c1: High risk (confidence 80%, mock)"));
        assert!(output.contains("Priority"));
        assert!(output.contains("1. Attend counseling"));
        assert!(output.contains("High risk assessment based on: test"));
    }

    #[test]
    fn test_verdict_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let verdict = MockClassifier::verdict(RiskLevel::Low);
        let output = formatter
            .format_verdict(&AccessId::from("c1"), &verdict)
            .unwrap();
        let parsed: Verdict = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, verdict);
    }

    #[test]
    fn test_feature_table_names_every_block() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_request(&request(), false).unwrap();
        assert!(output.contains("82 features"));
        assert!(output.contains("male_age"));
        assert!(output.contains("q59"));
        assert!(output.contains("maternal_health_alignment"));
    }

    #[test]
    fn test_full_request_is_json() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_request(&request(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["couple_id"], "c1");
        assert_eq!(value["feature_vector"].as_array().unwrap().len(), 82);
    }

    #[test]
    fn test_report_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut report = BatchReport::new();
        report.record_success(RiskLevel::Medium);
        report.record_failure(&AccessId::from("ghost"), "couple not found: ghost", false);

        let output = formatter.format_report(&report).unwrap();
        assert!(output.contains("Skipped"));
        assert!(output.contains("⚠ ghost: couple not found: ghost"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("bad"), "✗ bad");
    }
}
