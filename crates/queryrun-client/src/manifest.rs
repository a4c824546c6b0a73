//! Query manifest construction.
//!
//! The manifest is a typed document serialized with `serde_yaml`. The request
//! body ends up in `spec.input`, which the encoder writes as a literal block
//! whenever it spans several lines, so no user text can break the document
//! structure. A body with trailing whitespace on some line cannot be a
//! literal block; the encoder then falls back to a single double-quoted
//! scalar with `\n` escapes. Both forms parse back to the same body.

use serde::{Deserialize, Serialize};

use queryrun_core::{TargetKind, WorkRequest};

use crate::error::ManifestError;

/// API group and version of the `Query` resource.
pub const API_VERSION: &str = "ark.mckinsey.com/v1alpha1";

/// Resource kind submitted for every request.
pub const KIND: &str = "Query";

/// A declarative `Query` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMetadata,
    pub spec: ManifestSpec,
}

/// Identity of the resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,
    pub namespace: String,
}

/// What the control plane should run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSpec {
    /// Request body, line structure preserved.
    pub input: String,

    /// Always exactly one target.
    pub targets: Vec<ManifestTarget>,

    /// Collection hint for resources nobody deletes.
    pub ttl: String,
}

/// Executor reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestTarget {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub name: String,
}

/// Build the manifest for a request.
///
/// Pure: the same request and namespace always give the same manifest.
pub fn build_manifest(request: &WorkRequest, namespace: &str) -> ResourceManifest {
    ResourceManifest {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        metadata: ManifestMetadata {
            name: request.id.as_str().to_string(),
            namespace: namespace.to_string(),
        },
        spec: ManifestSpec {
            input: request.body.replace("\r\n", "\n"),
            targets: vec![ManifestTarget {
                kind: request.target_kind,
                name: request.target_name().to_string(),
            }],
            ttl: request.target_kind.ttl().to_string(),
        },
    }
}

impl ResourceManifest {
    /// Name the resource is created under.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Serialize to the YAML document handed to `kubectl apply`.
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryrun_core::{Region, RequestId};

    fn request(body: &str, region: Region) -> WorkRequest {
        WorkRequest::describe(body, region)
            .unwrap()
            .with_id(RequestId::new("office-query"))
    }

    fn reparse(yaml: &str) -> ResourceManifest {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_manifest_fields() {
        let manifest = build_manifest(&request("Build a 2-floor office", Region::Morocco), "ark");

        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert_eq!(manifest.name(), "office-query");
        assert_eq!(manifest.metadata.namespace, "ark");
        assert_eq!(manifest.spec.targets.len(), 1);
        assert_eq!(manifest.spec.targets[0].kind, TargetKind::Agent);
        assert_eq!(manifest.spec.targets[0].name, "company-finder-morocco");
        assert_eq!(manifest.spec.ttl, "5m");
    }

    #[test]
    fn test_document_manifest_targets_team() {
        let request = WorkRequest::from_document("plan.pdf", "Warehouse", Region::Asia)
            .unwrap()
            .with_id(RequestId::new("doc-query"));
        let manifest = build_manifest(&request, "default");

        assert_eq!(manifest.spec.targets[0].kind, TargetKind::Team);
        assert_eq!(manifest.spec.targets[0].name, "pdf-company-finder-team");
        assert_eq!(manifest.spec.ttl, "10m");
    }

    #[test]
    fn test_yaml_wire_keys() {
        let yaml = build_manifest(&request("Build", Region::Global), "default")
            .to_yaml()
            .unwrap();

        assert!(yaml.contains("apiVersion: ark.mckinsey.com/v1alpha1"));
        assert!(yaml.contains("kind: Query"));
        assert!(yaml.contains("name: office-query"));
        assert!(yaml.contains("namespace: default"));
        assert!(yaml.contains("type: agent"));
        assert!(yaml.contains("name: company-finder"));
        assert!(yaml.contains("ttl: 5m"));
    }

    #[test]
    fn test_body_lines_round_trip() {
        let bodies = [
            "Build a 2-floor office",
            "Line one\n\nLine three",
            "Header:\n  - nested: item\n\n\n# not a comment\ntrailing newline\n",
            "  leading indentation\nkey: value\n'quoted' \"double\"",
            "ttl: 1h\nspec:\n  targets: []",
            "Surface: 800 m²\nBudget: 1 200 000 MAD",
            "tab\tseparated\nline with trailing space \nend",
        ];

        for body in bodies {
            let yaml = build_manifest(&request(body, Region::Europe), "default")
                .to_yaml()
                .unwrap();
            let parsed = reparse(&yaml);

            assert_eq!(parsed.spec.input, body, "yaml was:\n{yaml}");
            assert_eq!(
                parsed.spec.input.lines().collect::<Vec<_>>(),
                body.lines().collect::<Vec<_>>()
            );
            assert_eq!(parsed.spec.targets[0].name, "company-finder");
            assert_eq!(parsed.metadata.name, "office-query");
        }
    }

    #[test]
    fn test_blank_lines_are_not_indented() {
        let yaml = build_manifest(&request("Line one\n\nLine three", Region::Global), "default")
            .to_yaml()
            .unwrap();
        let lines: Vec<&str> = yaml.lines().collect();
        let first = lines
            .iter()
            .position(|line| line.trim() == "Line one")
            .unwrap();

        assert!(lines[first].starts_with(' '));
        assert_eq!(lines[first + 1], "");
        assert!(lines[first + 2].starts_with(' '));
        assert_eq!(lines[first + 2].trim(), "Line three");
        assert!(yaml.lines().all(|line| !line.ends_with(' ')));
    }

    #[test]
    fn test_trailing_whitespace_body_falls_back_to_quoted_scalar() {
        let body = "line with trailing space \nend";
        let manifest = build_manifest(&request(body, Region::Global), "default");
        let yaml = manifest.to_yaml().unwrap();

        assert!(yaml.contains("input: \""));
        assert!(!yaml.lines().any(|line| line == "end"));

        let parsed: ResourceManifest = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.spec.input, body);
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_crlf_body_is_normalized() {
        let manifest = build_manifest(&request("one\r\ntwo", Region::Global), "default");
        assert_eq!(manifest.spec.input, "one\ntwo");
    }
}
