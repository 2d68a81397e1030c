//! Generator input: the deployment topology
//!
//! Read from YAML, JSON or TOML, picked by file extension. Map sections
//! keep document order so generated output follows the input.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Whole topology document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub ipfilter: IpFilters,

    /// Catch-all identifier -> listener
    #[serde(default)]
    pub catchall: IndexMap<String, CatchAll>,

    /// Environment name -> application
    #[serde(default)]
    pub app: IndexMap<String, App>,
}

/// Named CIDR lists a location can admit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpFilters {
    #[serde(default)]
    pub myfilter: Option<Vec<String>>,

    #[serde(default)]
    pub allowall: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatchAll {
    pub port: u16,
}

/// One environment served behind the proxy
#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub runtime_port: u16,

    #[serde(default)]
    pub fqdn: Option<Vec<String>>,

    /// Which catch-all listener the server binds to
    pub catchall: String,

    #[serde(default)]
    pub path_based_access_restriction: Option<IndexMap<String, PathRule>>,
}

/// Access rule for one location path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathRule {
    /// `myfilter` or `allowall`
    #[serde(default)]
    pub ipfilter: Option<String>,
}

impl Topology {
    /// Load a topology from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Topology> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topology file {}", path.display()))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = if ext.is_empty() { "yaml" } else { ext };
        tracing::info!("📄 Parsing topology {} as {}", path.display(), format);

        match ext {
            "yaml" | "yml" | "" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            "toml" => Self::from_toml(&content),
            _ => bail!("Unknown topology format: {}", ext),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Topology> {
        serde_yaml::from_str(content).context("Invalid YAML topology")
    }

    pub fn from_json(content: &str) -> Result<Topology> {
        serde_json::from_str(content).context("Invalid JSON topology")
    }

    pub fn from_toml(content: &str) -> Result<Topology> {
        toml::from_str(content).context("Invalid TOML topology")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "
ipfilter:
  myfilter:
    - 10.0.0.0/8
    - 192.168.1.0/24
  allowall:
catchall:
  default:
    port: 8080
app:
  staging:
    runtime_port: 9001
    fqdn: [staging.example.com]
    catchall: default
    path_based_access_restriction:
      /:
        ipfilter: allowall
      /admin:
        ipfilter: myfilter
  production:
    runtime_port: 9002
    catchall: default
";

    #[test]
    fn test_yaml_loading() {
        let topology = Topology::from_yaml(YAML).unwrap();
        assert_eq!(topology.ipfilter.myfilter.as_deref().unwrap().len(), 2);
        assert!(topology.ipfilter.allowall.is_none());
        assert_eq!(topology.catchall["default"].port, 8080);

        let envs: Vec<&str> = topology.app.keys().map(String::as_str).collect();
        assert_eq!(envs, ["staging", "production"]);

        let paths = topology.app["staging"].path_based_access_restriction.as_ref().unwrap();
        let keys: Vec<&str> = paths.keys().map(String::as_str).collect();
        assert_eq!(keys, ["/", "/admin"]);
        assert_eq!(paths["/admin"].ipfilter.as_deref(), Some("myfilter"));
        assert!(topology.app["production"].fqdn.is_none());
    }

    #[test]
    fn test_json_loading() {
        let json = r#"{"catchall": {"default": {"port": 80}}, "app": {}}"#;
        let topology = Topology::from_json(json).unwrap();
        assert_eq!(topology.catchall["default"].port, 80);
        assert!(topology.app.is_empty());
    }

    #[test]
    fn test_toml_loading() {
        let toml = "\
[catchall.default]
port = 8080

[app.dev]
runtime_port = 9000
catchall = \"default\"
";
        let topology = Topology::from_toml(toml).unwrap();
        assert_eq!(topology.app["dev"].runtime_port, 9000);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.yml");
        std::fs::write(&path, YAML).unwrap();
        assert_eq!(Topology::load(&path).unwrap().app.len(), 2);

        let path = dir.path().join("topology.ini");
        std::fs::write(&path, YAML).unwrap();
        assert!(Topology::load(&path).is_err());
    }

    #[test]
    fn test_missing_runtime_port_rejected() {
        let yaml = "app:\n  dev:\n    catchall: default\n";
        assert!(Topology::from_yaml(yaml).is_err());
    }
}
