use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Coloured marker used by the text renderers.
    pub fn indicator(self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(format!("invalid risk level: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub level: RiskLevel,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub flag: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub command: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub max_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// One command-reference entry.
///
/// The index only ever reads `name`, `category`, `description` and
/// `platforms`; everything else is carried for the renderers. Absent keys
/// deserialize to empty values and are reported by [`Command::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub install_required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub install_method: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage: Vec<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_commands: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl Command {
    /// Check the fields a loaded entry must carry.
    pub fn validate(&self) -> Result<(), ModelError> {
        let missing = if self.name.is_empty() {
            Some("name")
        } else if self.category.is_empty() {
            Some("category")
        } else if self.description.is_empty() {
            Some("description")
        } else if self.usage.is_empty() {
            Some("usage")
        } else if self.examples.is_empty() {
            Some("examples")
        } else if self.platforms.is_empty() {
            Some("platforms")
        } else {
            None
        };

        match missing {
            Some(field) => Err(ModelError::MissingField { field }),
            None => Ok(()),
        }
    }

    /// Highest declared risk, `Low` when none is listed.
    pub fn highest_risk(&self) -> RiskLevel {
        self.risks
            .iter()
            .map(|r| r.level)
            .max()
            .unwrap_or(RiskLevel::Low)
    }

    pub fn supports_platform(&self, platform: &str) -> bool {
        self.platforms.iter().any(|p| p == platform)
    }
}

/// One data file: a batch of commands sharing a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandList {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CommandList {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.category.is_empty() {
            return Err(ModelError::MissingField { field: "category" });
        }
        if self.description.is_empty() {
            return Err(ModelError::MissingField {
                field: "description",
            });
        }
        for cmd in &self.commands {
            cmd.validate().map_err(|e| ModelError::InvalidCommand {
                name: cmd.name.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl Category {
    pub fn is_top_level(&self) -> bool {
        self.parent.is_empty()
    }
}

/// The manifest (`metadata.yaml`) naming every data file of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
    #[serde(default)]
    pub data_files: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Metadata {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version.is_empty() {
            return Err(ModelError::MissingField { field: "version" });
        }
        if self.categories.is_empty() {
            return Err(ModelError::MissingField {
                field: "categories",
            });
        }
        if self.data_files.is_empty() {
            return Err(ModelError::MissingField {
                field: "data_files",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_command() -> Command {
        Command {
            name: "ls".into(),
            category: "OS/Linux".into(),
            description: "list directory contents".into(),
            usage: vec!["ls [OPTION]... [FILE]...".into()],
            examples: vec![Example {
                command: "ls -la".into(),
                description: "long listing".into(),
                output: String::new(),
            }],
            platforms: vec!["linux".into(), "macos".into()],
            ..Command::default()
        }
    }

    #[test]
    fn valid_command_passes() {
        assert!(valid_command().validate().is_ok());
    }

    #[test]
    fn reports_first_missing_field() {
        let mut cmd = valid_command();
        cmd.description.clear();
        cmd.platforms.clear();
        match cmd.validate() {
            Err(ModelError::MissingField { field }) => assert_eq!(field, "description"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn highest_risk_defaults_to_low() {
        let mut cmd = valid_command();
        assert_eq!(cmd.highest_risk(), RiskLevel::Low);
        cmd.risks = vec![
            Risk {
                level: RiskLevel::Medium,
                description: "m".into(),
            },
            Risk {
                level: RiskLevel::Critical,
                description: "c".into(),
            },
            Risk {
                level: RiskLevel::High,
                description: "h".into(),
            },
        ];
        assert_eq!(cmd.highest_risk(), RiskLevel::Critical);
    }

    #[test]
    fn command_list_names_the_invalid_command() {
        let mut bad = valid_command();
        bad.name = "rm".into();
        bad.usage.clear();
        let list = CommandList {
            category: "OS/Linux".into(),
            description: "coreutils".into(),
            commands: vec![valid_command(), bad],
            updated_at: None,
        };
        let err = list.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid command 'rm': missing required field: usage"
        );
    }

    #[test]
    fn metadata_requires_data_files() {
        let mut meta = Metadata {
            version: "1.0".into(),
            ..Metadata::default()
        };
        meta.categories.insert(
            "os".into(),
            Category {
                id: "os".into(),
                name: "OS".into(),
                ..Category::default()
            },
        );
        assert!(matches!(
            meta.validate(),
            Err(ModelError::MissingField {
                field: "data_files"
            })
        ));
    }

    #[test]
    fn unknown_risk_level_fails_to_parse() {
        let yaml = "level: catastrophic\ndescription: boom\n";
        assert!(serde_yaml::from_str::<Risk>(yaml).is_err());
        assert_eq!("HIGH".parse::<RiskLevel>(), Ok(RiskLevel::High));
    }

    #[test]
    fn descriptive_fields_default_when_absent() {
        let yaml = "name: cat\ncategory: OS/Linux\ndescription: concatenate files\n";
        let cmd: Command = serde_yaml::from_str(yaml).unwrap();
        assert!(cmd.usage.is_empty());
        assert!(cmd.versions.is_none());
        assert!(!cmd.install_required);
    }

    #[test]
    fn absent_required_key_is_a_validation_error() {
        let yaml = "name: cat\ncategory: OS/Linux\nusage: [cat]\n";
        let cmd: Command = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            cmd.validate(),
            Err(ModelError::MissingField {
                field: "description"
            })
        ));

        let meta: Metadata = serde_yaml::from_str("data_files: [a.yaml]\n").unwrap();
        assert!(matches!(
            meta.validate(),
            Err(ModelError::MissingField { field: "version" })
        ));
    }
}
