use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::insertion::InsertionAction;

/// A template document: groups of nodes rooted at base paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub file_paths: Vec<PathGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathGroup {
    /// Base directory, relative to the output root. May contain placeholders.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// A file, or a directory when it has children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub code: String,
    /// Files that aggregate references to generated units (barrels, schema
    /// lists). New indexers keep their `ADD` markers for later merges.
    #[serde(default)]
    pub is_indexer: bool,
    #[serde(default)]
    pub children: Vec<Node>,
    /// Applied in order when the file already exists, before the marker merge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insertions: Vec<InsertionAction>,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        !self.children.is_empty()
    }
}

impl Template {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parses raw template bytes, JSON first and YAML when that fails.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(bytes)?;
        match Self::from_json_str(s) {
            Ok(template) => Ok(template),
            Err(json_err) => Self::from_yaml_str(s).map_err(|_| json_err),
        }
    }

    /// Loads a template file; `.yaml`/`.yml` are read as YAML, anything else
    /// as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Number of file (leaf) nodes across all groups.
    pub fn file_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|n| if n.is_dir() { count(&n.children) } else { 1 })
                .sum()
        }
        self.file_paths.iter().map(|g| count(&g.nodes)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insertion::Occurrence;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const JSON: &str = r#"{
        "filePaths": [
            {
                "path": "schemas",
                "nodes": [
                    {"name": "{{.Name}}.ts", "code": "export default {}"},
                    {
                        "name": "index.ts",
                        "code": "// ADD VALUE BELOW",
                        "isIndexer": true,
                        "insertions": [
                            {"type": "addMarkerBelowTarget", "target": "schemaTypes", "key": "VALUE"}
                        ]
                    },
                    {"name": "nested", "children": [{"name": "a.txt"}, {"name": "b.txt"}]}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_json() {
        let template = Template::from_json_str(JSON).unwrap();
        let nodes = &template.file_paths[0].nodes;
        assert_eq!(template.file_paths[0].path, "schemas");
        assert!(!nodes[0].is_indexer);
        assert!(nodes[1].is_indexer);
        assert!(nodes[2].is_dir());
        assert_eq!(template.file_count(), 4);
        match &nodes[1].insertions[0] {
            InsertionAction::AddMarkerBelowTarget(a) => assert_eq!(a.occurrence, Occurrence::First),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "filePaths:\n  - path: src\n    nodes:\n      - name: main.rs\n        code: fn main() {}\n";
        let template = Template::from_slice(yaml.as_bytes()).unwrap();
        assert_eq!(template.file_paths[0].nodes[0].code, "fn main() {}");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Template::from_json_str("{\"filePaths\": [}"),
            Err(Error::TemplateJson(_))
        ));
        assert!(Template::from_slice(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", JSON).unwrap();
        let template = Template::load(file.path()).unwrap();
        assert_eq!(template.file_count(), 4);

        let missing = Template::load(Path::new("does/not/exist.json"));
        assert!(matches!(missing, Err(Error::TemplateRead { .. })));
    }
}
