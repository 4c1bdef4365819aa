//! Report encoding
//!
//! Wraps an impact result into the envelope handed to downstream consumers
//! (PDF export, sharing). Adds producer metadata and the presentation summary
//! the results screen derives from the score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::NO_IMPACT_SENTINEL;
use crate::error::ImpactError;
use crate::reference::ReferenceData;
use crate::types::ImpactResult;
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Title used when sharing a result
pub const SHARE_TITLE: &str = "Mon diagnostic écrans famille";

/// Site promoted by the clipboard fallback
pub const APP_URL: &str = "https://www.grenadille.app/";

/// Lower bound of the favorable score band
pub const FAVORABLE_THRESHOLD: u8 = 70;

/// Lower bound of the watch score band
pub const WATCH_THRESHOLD: u8 = 50;

/// How the child's screen time compares with the age average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonVerdict {
    #[serde(rename = "INFÉRIEUR")]
    Inferieur,
    #[serde(rename = "SUPÉRIEUR")]
    Superieur,
}

impl ComparisonVerdict {
    /// Only the no-impact sentinel reads as below average
    pub fn from_total(total_score: u8) -> Self {
        if total_score == NO_IMPACT_SENTINEL {
            ComparisonVerdict::Inferieur
        } else {
            ComparisonVerdict::Superieur
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonVerdict::Inferieur => "INFÉRIEUR",
            ComparisonVerdict::Superieur => "SUPÉRIEUR",
        }
    }
}

/// Colour band of the total score on the results screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Favorable,
    Watch,
    Concerning,
}

impl ScoreBand {
    pub fn from_total(total_score: u8) -> Self {
        if total_score >= FAVORABLE_THRESHOLD {
            ScoreBand::Favorable
        } else if total_score >= WATCH_THRESHOLD {
            ScoreBand::Watch
        } else {
            ScoreBand::Concerning
        }
    }
}

/// Share sheet payload
///
/// `url` is the page being shared and travels apart from the text, as share
/// sheets expect. Platforms without a share sheet copy
/// [`ShareMessage::clipboard_text`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareMessage {
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ShareMessage {
    pub fn from_result(result: &ImpactResult, url: Option<&str>) -> Self {
        Self {
            title: SHARE_TITLE.to_string(),
            text: format!(
                "J'ai obtenu un score de {}/100 sur l'impact des écrans. {}",
                result.total_score, result.shock_phrase
            ),
            url: url.map(str::to_string),
        }
    }

    /// Single-string fallback copied to the clipboard
    pub fn clipboard_text(result: &ImpactResult) -> String {
        format!(
            "Mon diagnostic écrans: Score {}/100. {} Découvrez Grenadille: {}",
            result.total_score, result.shock_phrase, APP_URL
        )
    }
}

/// Report producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
    pub reference_version: String,
}

/// Presentation summary derived from the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub verdict: ComparisonVerdict,
    pub score_band: ScoreBand,
    pub share: ShareMessage,
}

/// Envelope handed to downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub result: ImpactResult,
    pub summary: ReportSummary,
}

/// Report encoder
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
    share_url: Option<String>,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            share_url: None,
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            share_url: None,
        }
    }

    /// Attach the shared page URL to share messages
    pub fn with_share_url(mut self, url: impl Into<String>) -> Self {
        self.share_url = Some(url.into());
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode a result into a report stamped with the current time
    pub fn encode(&self, result: ImpactResult, reference: &ReferenceData) -> ImpactReport {
        self.encode_at(result, reference, Utc::now())
    }

    /// Encode a result into a report stamped with `computed_at`
    pub fn encode_at(
        &self,
        result: ImpactResult,
        reference: &ReferenceData,
        computed_at: DateTime<Utc>,
    ) -> ImpactReport {
        let summary = ReportSummary {
            verdict: ComparisonVerdict::from_total(result.total_score),
            score_band: ScoreBand::from_total(result.total_score),
            share: ShareMessage::from_result(&result, self.share_url.as_deref()),
        };

        ImpactReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
                reference_version: reference.version.clone(),
            },
            computed_at_utc: computed_at.to_rfc3339(),
            result,
            summary,
        }
    }

    /// Encode to pretty JSON
    pub fn encode_to_json(
        &self,
        result: ImpactResult,
        reference: &ReferenceData,
    ) -> Result<String, ImpactError> {
        let report = self.encode(result, reference);
        serde_json::to_string_pretty(&report).map_err(|e| ImpactError::EncodingError(e.to_string()))
    }
}
