//! Work request types and target selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, RequestId};

/// Agent answering single-description requests outside Morocco.
pub const DEFAULT_AGENT: &str = "company-finder";
/// Agent specialised in the Moroccan market.
pub const MOROCCO_AGENT: &str = "company-finder-morocco";
/// Team running the multi-step document analysis outside Morocco.
pub const DEFAULT_TEAM: &str = "pdf-company-finder-team";
/// Team running the document analysis for the Moroccan market.
pub const MOROCCO_TEAM: &str = "pdf-company-finder-team-morocco";

/// Region the candidate companies should come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Morocco,
    #[default]
    Global,
    Europe,
    NorthAmerica,
    Asia,
}

impl Region {
    /// Human-readable label, as shown to the executing agent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morocco => "Morocco",
            Self::Global => "Global",
            Self::Europe => "Europe",
            Self::NorthAmerica => "North America",
            Self::Asia => "Asia",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "morocco" => Ok(Self::Morocco),
            "global" => Ok(Self::Global),
            "europe" => Ok(Self::Europe),
            "northamerica" => Ok(Self::NorthAmerica),
            "asia" => Ok(Self::Asia),
            _ => Err(CoreError::InvalidRegion(s.to_string())),
        }
    }
}

/// Kind of executor a request is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A single agent answering in one step.
    Agent,
    /// A multi-step team of agents.
    Team,
}

impl TargetKind {
    /// Wire name of the target type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Team => "team",
        }
    }

    /// Time-to-live hint after which the control plane collects the resource.
    pub fn ttl(&self) -> &'static str {
        match self {
            Self::Agent => "5m",
            Self::Team => "10m",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the executor name for a region label and target kind.
///
/// Total over all inputs: only "morocco" (any case, surrounding whitespace
/// ignored) selects the region-specialised target.
pub fn resolve_target_name(region: &str, kind: TargetKind) -> &'static str {
    let morocco = region.trim().eq_ignore_ascii_case("morocco");
    match (kind, morocco) {
        (TargetKind::Agent, true) => MOROCCO_AGENT,
        (TargetKind::Agent, false) => DEFAULT_AGENT,
        (TargetKind::Team, true) => MOROCCO_TEAM,
        (TargetKind::Team, false) => DEFAULT_TEAM,
    }
}

/// A request to find companies for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRequest {
    /// Identity of the request and of its remote resource.
    pub id: RequestId,

    /// Text handed to the executor.
    pub body: String,

    /// Region used for target selection.
    pub region: Region,

    /// Executor kind.
    pub target_kind: TargetKind,
}

impl WorkRequest {
    /// Create a request from a free-text project description.
    pub fn describe(description: impl Into<String>, region: Region) -> Result<Self, CoreError> {
        let body = description.into();
        if body.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "project description is empty".to_string(),
            ));
        }

        Ok(Self {
            id: RequestId::generate("query"),
            body,
            region,
            target_kind: TargetKind::Agent,
        })
    }

    /// Create a document analysis request from text extracted from a file.
    pub fn from_document(
        file_name: &str,
        extracted_text: &str,
        region: Region,
    ) -> Result<Self, CoreError> {
        if extracted_text.trim().is_empty() {
            return Err(CoreError::InvalidInput(format!(
                "no text extracted from {}",
                file_name
            )));
        }

        let body = format!(
            "Please analyze the following document and find suitable companies for the project:\n\
             \n\
             Document: {file_name}\n\
             Document content: {extracted_text}\n\
             \n\
             Please:\n\
             1. Analyze the document content to extract project requirements\n\
             2. Coordinate the analysis with company research\n\
             3. Find the best companies for this project\n\
             4. Provide comprehensive recommendations\n\
             \n\
             Region: {region}"
        );

        Ok(Self {
            id: RequestId::generate("pdf-query"),
            body,
            region,
            target_kind: TargetKind::Team,
        })
    }

    /// Builder method to set a specific ID.
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    /// Name of the executor this request is dispatched to.
    pub fn target_name(&self) -> &'static str {
        resolve_target_name(self.region.as_str(), self.target_kind)
    }
}
