use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::time::Duration;

/// Longest error summary carried in a failure message.
pub const MAX_REASON_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Failure,
}

/// Outcome of one pipeline stage, addressed to whoever watches the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineEvent {
    pub pipeline_id: String,
    pub stage_id: String,
    pub run_id: String,
    pub run_date: NaiveDate,
    pub status: EventStatus,
    pub error: Option<String>,
    pub duration: Option<Duration>,
    pub occurred_at: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn success(
        pipeline_id: impl Into<String>,
        stage_id: impl Into<String>,
        run_id: impl Into<String>,
        run_date: NaiveDate,
        duration: Duration,
    ) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            stage_id: stage_id.into(),
            run_id: run_id.into(),
            run_date,
            status: EventStatus::Success,
            error: None,
            duration: Some(duration),
            occurred_at: Utc::now(),
        }
    }

    pub fn failure(
        pipeline_id: impl Into<String>,
        stage_id: impl Into<String>,
        run_id: impl Into<String>,
        run_date: NaiveDate,
        error: impl ToString,
        duration: Duration,
    ) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            stage_id: stage_id.into(),
            run_id: run_id.into(),
            run_date,
            status: EventStatus::Failure,
            error: Some(shorten(&error.to_string(), MAX_REASON_CHARS)),
            duration: Some(duration),
            occurred_at: Utc::now(),
        }
    }

    /// Plain-text body shared by every webhook target and the log fallback.
    pub fn render_text(&self) -> String {
        let status = match self.status {
            EventStatus::Success => "SUCCESS",
            EventStatus::Failure => "FAILURE",
        };

        let mut lines = Vec::new();
        if let Some(reason) = &self.error {
            lines.push(format!("Failure reason: {}", reason));
        }
        lines.push(format!("Pipeline stage {}", status));
        lines.push(format!("Pipeline: {}", self.pipeline_id));
        lines.push(format!("Stage: {}", self.stage_id));
        lines.push(format!("Run: {}", self.run_id));
        lines.push(format!("Run date: {}", self.run_date));
        if let Some(duration) = self.duration {
            lines.push(format!("Duration: {}s", duration.as_secs()));
        }
        lines.push(format!(
            "When (UTC): {}",
            self.occurred_at.format("%Y-%m-%d %H:%M:%S")
        ));

        lines.join("\n")
    }
}

/// Collapses whitespace and cuts `text` to at most `width` characters,
/// ending in " ..." when something was dropped.
pub fn shorten(text: &str, width: usize) -> String {
    const PLACEHOLDER: &str = " ...";

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let keep = width.saturating_sub(PLACEHOLDER.len());
    let mut cut: String = collapsed.chars().take(keep).collect();
    if let Some(idx) = cut.rfind(' ') {
        cut.truncate(idx);
    }
    cut.push_str(PLACEHOLDER);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn failure_text_leads_with_reason() {
        let event = PipelineEvent::failure(
            "breweries",
            "build_silver",
            "run-1",
            date(),
            "Source not found: data/bronze",
            Duration::from_secs(3),
        );

        let text = event.render_text();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "Failure reason: Source not found: data/bronze");
        assert!(text.contains("Pipeline stage FAILURE"));
        assert!(text.contains("Stage: build_silver"));
        assert!(text.contains("Run: run-1"));
        assert!(text.contains("Duration: 3s"));
    }

    #[test]
    fn success_text_has_no_reason() {
        let event = PipelineEvent::success("breweries", "build_gold", "run-1", date(), Duration::ZERO);
        let text = event.render_text();
        assert!(text.starts_with("Pipeline stage SUCCESS"));
        assert!(!text.contains("Failure reason"));
    }

    #[test]
    fn long_reasons_are_shortened() {
        let reason = "violation ".repeat(200);
        let event = PipelineEvent::failure("p", "s", "r", date(), reason, Duration::ZERO);
        let stored = event.error.unwrap();
        assert!(stored.chars().count() <= MAX_REASON_CHARS);
        assert!(stored.ends_with(" ..."));
    }

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(shorten("a  b\nc", 10), "a b c");
    }
}
