//! `gbind.toml` parsing and generator configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gbind_emit::OutputConfig;
use gbind_normalize::NormalizeConfig;
use gbind_types::{Cleanup, Conversion, TypeMapper, TypeRule};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "gbind.toml";

/// The whole configuration file; every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GbindConfig {
    /// `[naming]`, `[skip]`, `[namespaces]` and `[[receivers]]`.
    #[serde(flatten)]
    pub normalize: NormalizeConfig,
    /// Extra type rules layered over the built-in table.
    pub rules: Vec<RuleConfig>,
    pub output: OutputConfig,
}

/// One `[[rules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub native: String,
    pub target: String,
    /// Restrict the rule to contexts matching this pattern.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub to_native: Option<String>,
    #[serde(default)]
    pub to_target: Option<String>,
    #[serde(default)]
    pub cleanup: Option<Cleanup>,
}

impl RuleConfig {
    pub fn to_rule(&self) -> TypeRule {
        let mut rule = TypeRule::new(self.native.as_str(), self.target.as_str());
        if let Some(element) = &self.element_type {
            rule = rule.with_element(element.as_str());
        }
        if let Some(convert) = &self.to_native {
            rule = rule.with_to_native(Conversion::parse(convert));
        }
        if let Some(convert) = &self.to_target {
            rule = rule.with_to_target(Conversion::parse(convert));
        }
        if let Some(cleanup) = self.cleanup {
            rule = rule.with_cleanup(cleanup);
        }
        rule.nullable = self.nullable;
        rule
    }
}

impl GbindConfig {
    /// Load from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Search for `gbind.toml` starting from `start_dir` and walking up.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some((Self::load(&candidate)?, candidate)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// The explicit file if given, else the nearest one, else defaults.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::find_and_load(cwd)? {
            Some((config, path)) => {
                tracing::debug!(path = %path.display(), "using configuration file");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// The default rule table with the configured rules layered on top.
    pub fn mapper(&self) -> TypeMapper {
        let mut mapper = TypeMapper::with_defaults();
        for rule in &self.rules {
            match &rule.context {
                Some(context) => mapper.insert_scoped(context, rule.to_rule()),
                None => mapper.insert(rule.to_rule()),
            }
        }
        mapper
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing gbind.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = GbindConfig::from_str("").unwrap();
        assert_eq!(config.normalize, NormalizeConfig::default());
        assert_eq!(config.output, OutputConfig::default());
        assert!(config.rules.is_empty());
    }

    #[test]
    fn sections_parse() {
        let config = GbindConfig::from_str(
            r#"
[naming]
prefix = "tch"

[skip]
deny = ["data", "resize_"]

[[receivers]]
native = "Tensor"
marker = "tensor"

[[rules]]
native = "at::QScheme"
target = "TorchQScheme"
to_native = "torch_qscheme_to_real"
to_target = "torch_qscheme_from_real"

[[rules]]
native = "double"
target = "gfloat"
context = "Dropout*"

[output]
header_includes = ["my-header.h"]
"#,
        )
        .unwrap();
        assert_eq!(config.normalize.naming.prefix, "tch");
        assert_eq!(config.normalize.naming.type_prefix, "Torch");
        assert_eq!(config.normalize.skip.deny, vec!["data", "resize_"]);
        assert_eq!(config.normalize.receivers.len(), 1);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.output.header_includes, vec!["my-header.h"]);
        assert_eq!(config.output.source_preamble, OutputConfig::default().source_preamble);

        let mapper = config.mapper();
        let rule = mapper.resolve("at::QScheme", None).unwrap();
        assert_eq!(rule.target.as_str(), "TorchQScheme");
        assert_eq!(rule.to_native, Conversion::Call("torch_qscheme_to_real".into()));
        assert_eq!(
            mapper.resolve("double", Some("DropoutOptions")).unwrap().target.as_str(),
            "gfloat"
        );
        assert_eq!(mapper.resolve("double", None).unwrap().target.as_str(), "double");
    }

    #[test]
    fn cleanup_spelling() {
        let config = GbindConfig::from_str(
            "[[rules]]\nnative = \"X\"\ntarget = \"TorchX *\"\ncleanup = \"auto_ptr\"\n",
        )
        .unwrap();
        assert_eq!(config.rules[0].to_rule().cleanup, Cleanup::AutoPtr);
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[naming]\nprefix = \"up\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = GbindConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(config.normalize.naming.prefix, "up");
        assert_eq!(path, dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(GbindConfig::resolve(Some(&missing), dir.path()).is_err());
    }
}
