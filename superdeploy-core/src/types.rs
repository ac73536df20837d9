//! Domain types for SuperDeploy.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! A [`DeploymentDescriptor`] is produced fresh by the resolver on every
//! command and is never persisted.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a registered project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl ProjectName {
    /// Validate `raw` as a project name.
    ///
    /// The name becomes both a registry line (`"<name> is a project"`) and a
    /// directory under the projects root, so whitespace, path separators,
    /// dot segments and a leading `-` are rejected.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = |reason| RegistryError::InvalidName {
            name: raw.to_owned(),
            reason,
        };
        if raw.is_empty() {
            return Err(invalid("name is empty"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(invalid("name contains whitespace"));
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(invalid("name contains a path separator"));
        }
        if raw == "." || raw == ".." {
            return Err(invalid("name is a relative path segment"));
        }
        if raw.starts_with('-') {
            return Err(invalid("name starts with '-'"));
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How a custom deployment script is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptInterpreter {
    /// Executed directly (shebang + executable bit).
    Direct,
    /// Passed to the configured Python interpreter.
    Python,
}

impl fmt::Display for ScriptInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptInterpreter::Direct => write!(f, "direct"),
            ScriptInterpreter::Python => write!(f, "python"),
        }
    }
}

/// One of the three recognised Ansible file-naming conventions.
///
/// Variants are declared in precedence order; [`AnsibleLayout::ALL`] is the
/// order the resolver evaluates them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnsibleLayout {
    /// `deploy.yml` + `inventory.yml`
    Modern,
    /// `playbook.yml` + `inventory.yml`
    Alternate,
    /// `site.yml` + `inventory/`
    Traditional,
}

impl AnsibleLayout {
    pub const ALL: [AnsibleLayout; 3] = [
        AnsibleLayout::Modern,
        AnsibleLayout::Alternate,
        AnsibleLayout::Traditional,
    ];

    /// Playbook file name, relative to the `ansible/` directory.
    pub fn playbook(self) -> &'static str {
        match self {
            AnsibleLayout::Modern => "deploy.yml",
            AnsibleLayout::Alternate => "playbook.yml",
            AnsibleLayout::Traditional => "site.yml",
        }
    }

    /// Inventory path, relative to the `ansible/` directory.
    pub fn inventory(self) -> &'static str {
        match self {
            AnsibleLayout::Modern | AnsibleLayout::Alternate => "inventory.yml",
            AnsibleLayout::Traditional => "inventory",
        }
    }

    /// `true` when the inventory is a directory rather than a single file.
    pub fn inventory_is_dir(self) -> bool {
        matches!(self, AnsibleLayout::Traditional)
    }
}

impl fmt::Display for AnsibleLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnsibleLayout::Modern => write!(f, "modern"),
            AnsibleLayout::Alternate => write!(f, "alternate"),
            AnsibleLayout::Traditional => write!(f, "traditional"),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// A project-owned deployment entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomScript {
    /// Absolute path to the script.
    pub path: PathBuf,
    pub interpreter: ScriptInterpreter,
}

/// A recognised `ansible/` directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsibleConfig {
    /// Absolute path to the `ansible/` directory.
    pub dir: PathBuf,
    pub layout: AnsibleLayout,
}

impl AnsibleConfig {
    pub fn playbook_path(&self) -> PathBuf {
        self.dir.join(self.layout.playbook())
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.dir.join(self.layout.inventory())
    }
}

/// How a given project is deployed, as resolved from its directory contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeploymentDescriptor {
    CustomScript(CustomScript),
    TerraformAnsible {
        terraform: PathBuf,
        ansible: AnsibleConfig,
    },
    TerraformOnly {
        terraform: PathBuf,
    },
    AnsibleOnly {
        ansible: AnsibleConfig,
    },
    NotFound,
}

impl DeploymentDescriptor {
    /// Short machine-friendly label, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DeploymentDescriptor::CustomScript(_) => "custom_script",
            DeploymentDescriptor::TerraformAnsible { .. } => "terraform_ansible",
            DeploymentDescriptor::TerraformOnly { .. } => "terraform_only",
            DeploymentDescriptor::AnsibleOnly { .. } => "ansible_only",
            DeploymentDescriptor::NotFound => "not_found",
        }
    }

    pub fn terraform_dir(&self) -> Option<&Path> {
        match self {
            DeploymentDescriptor::TerraformAnsible { terraform, .. }
            | DeploymentDescriptor::TerraformOnly { terraform } => Some(terraform),
            _ => None,
        }
    }

    pub fn ansible(&self) -> Option<&AnsibleConfig> {
        match self {
            DeploymentDescriptor::TerraformAnsible { ansible, .. }
            | DeploymentDescriptor::AnsibleOnly { ansible } => Some(ansible),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, DeploymentDescriptor::NotFound)
    }
}

impl fmt::Display for DeploymentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentDescriptor::CustomScript(script) => match script.interpreter {
                ScriptInterpreter::Direct => write!(f, "custom script {}", script.path.display()),
                ScriptInterpreter::Python => {
                    write!(f, "custom python script {}", script.path.display())
                }
            },
            DeploymentDescriptor::TerraformAnsible { ansible, .. } => {
                write!(f, "terraform + ansible ({} layout)", ansible.layout)
            }
            DeploymentDescriptor::TerraformOnly { .. } => write!(f, "terraform only"),
            DeploymentDescriptor::AnsibleOnly { ansible } => {
                write!(f, "ansible only ({} layout)", ansible.layout)
            }
            DeploymentDescriptor::NotFound => write!(f, "no deployable structure"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(ProjectName::from("alpha").to_string(), "alpha");
    }

    #[test]
    fn parse_accepts_plain_names() {
        for name in ["alpha", "my-app", "svc_2", "web.frontend"] {
            assert_eq!(ProjectName::parse(name).expect(name).as_str(), name);
        }
    }

    #[test]
    fn parse_rejects_names_that_break_the_line_grammar() {
        for name in ["", "two words", "a/b", "..", "-x", "tab\tname"] {
            let err = ProjectName::parse(name).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidName { .. }), "{name:?}: {err}");
        }
    }

    #[test]
    fn layout_file_names() {
        assert_eq!(AnsibleLayout::Modern.playbook(), "deploy.yml");
        assert_eq!(AnsibleLayout::Alternate.playbook(), "playbook.yml");
        assert_eq!(AnsibleLayout::Traditional.playbook(), "site.yml");
        assert_eq!(AnsibleLayout::Traditional.inventory(), "inventory");
        assert!(AnsibleLayout::Traditional.inventory_is_dir());
        assert!(!AnsibleLayout::Modern.inventory_is_dir());
    }

    #[test]
    fn descriptor_accessors() {
        let ansible = AnsibleConfig {
            dir: PathBuf::from("/p/ansible"),
            layout: AnsibleLayout::Alternate,
        };
        let d = DeploymentDescriptor::TerraformAnsible {
            terraform: PathBuf::from("/p/terraform"),
            ansible: ansible.clone(),
        };
        assert_eq!(d.kind(), "terraform_ansible");
        assert_eq!(d.terraform_dir(), Some(Path::new("/p/terraform")));
        assert_eq!(d.ansible(), Some(&ansible));
        assert_eq!(ansible.playbook_path(), PathBuf::from("/p/ansible/playbook.yml"));
        assert!(!DeploymentDescriptor::NotFound.is_found());
    }

    #[test]
    fn descriptor_serializes_with_kind_tag() {
        let d = DeploymentDescriptor::CustomScript(CustomScript {
            path: PathBuf::from("/p/deploy.sh"),
            interpreter: ScriptInterpreter::Direct,
        });
        let json = serde_json::to_value(&d).expect("serialize");
        assert_eq!(json["kind"], "custom_script");
        assert_eq!(json["interpreter"], "direct");

        let json = serde_json::to_value(DeploymentDescriptor::NotFound).expect("serialize");
        assert_eq!(json["kind"], "not_found");
    }
}
