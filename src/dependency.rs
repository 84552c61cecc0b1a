//! The concrete build-model payload the process-wide pool deduplicates.
//!
//! A `Dependency` is an immutable record of one declared dependency:
//! coordinates, scope, exclusions, and the provenance of its declaration.
//! Records are constructed through [`DependencyBuilder`], which validates
//! before any pooling can happen; a record that exists is always
//! well-formed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Resolution scope of a dependency declaration.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DependencyScope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl DependencyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyScope::Compile => "compile",
            DependencyScope::Provided => "provided",
            DependencyScope::Runtime => "runtime",
            DependencyScope::Test => "test",
            DependencyScope::System => "system",
            DependencyScope::Import => "import",
        }
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transitive dependency excluded from resolution.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

/// Where a dependency was declared: source identifier plus line and column.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SourceLocation {
    pub source: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(source: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }
}

/// Validation failure while building a [`Dependency`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum DependencyError {
    #[error("missing required coordinate `{0}`")]
    MissingCoordinate(&'static str),
    #[error("system path is only valid with the `system` scope, not `{0}`")]
    SystemPathScope(DependencyScope),
}

/// One declared dependency, immutable once built.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Dependency {
    group_id: String,
    artifact_id: String,
    version: String,
    dep_type: String,
    classifier: Option<String>,
    scope: DependencyScope,
    optional: bool,
    system_path: Option<PathBuf>,
    exclusions: Vec<Exclusion>,
    declared_at: Option<SourceLocation>,
}

impl Dependency {
    pub fn builder() -> DependencyBuilder {
        DependencyBuilder::default()
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dep_type(&self) -> &str {
        &self.dep_type
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn scope(&self) -> DependencyScope {
        self.scope
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn system_path(&self) -> Option<&PathBuf> {
        self.system_path.as_ref()
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    pub fn declared_at(&self) -> Option<&SourceLocation> {
        self.declared_at.as_ref()
    }

    /// The key under which dependency management entries override this
    /// dependency: `group:artifact:type`, plus `:classifier` when set.
    /// Version and scope deliberately do not participate.
    pub fn management_key(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.dep_type, classifier
            ),
            None => format!("{}:{}:{}", self.group_id, self.artifact_id, self.dep_type),
        }
    }
}

/// The pooling predicate for dependencies: every field must match exactly,
/// declaration provenance included. Two textually identical declarations
/// from different locations stay distinct.
pub fn dependency_equals(a: &Dependency, b: &Dependency) -> bool {
    a.group_id == b.group_id
        && a.artifact_id == b.artifact_id
        && a.version == b.version
        && a.dep_type == b.dep_type
        && a.classifier == b.classifier
        && a.scope == b.scope
        && a.optional == b.optional
        && a.system_path == b.system_path
        && a.exclusions == b.exclusions
        && a.declared_at == b.declared_at
}

/// Builder for [`Dependency`]; `build` validates coordinates and scope.
#[derive(Clone, Debug)]
pub struct DependencyBuilder {
    group_id: String,
    artifact_id: String,
    version: String,
    dep_type: String,
    classifier: Option<String>,
    scope: DependencyScope,
    optional: bool,
    system_path: Option<PathBuf>,
    exclusions: Vec<Exclusion>,
    declared_at: Option<SourceLocation>,
}

impl Default for DependencyBuilder {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            artifact_id: String::new(),
            version: String::new(),
            dep_type: "jar".to_owned(),
            classifier: None,
            scope: DependencyScope::default(),
            optional: false,
            system_path: None,
            exclusions: Vec::new(),
            declared_at: None,
        }
    }
}

impl DependencyBuilder {
    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn artifact_id(mut self, artifact_id: impl Into<String>) -> Self {
        self.artifact_id = artifact_id.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn dep_type(mut self, dep_type: impl Into<String>) -> Self {
        self.dep_type = dep_type.into();
        self
    }

    pub fn classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn system_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.system_path = Some(path.into());
        self
    }

    pub fn exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn declared_at(mut self, location: SourceLocation) -> Self {
        self.declared_at = Some(location);
        self
    }

    pub fn build(self) -> Result<Dependency, DependencyError> {
        if self.group_id.is_empty() {
            return Err(DependencyError::MissingCoordinate("group_id"));
        }
        if self.artifact_id.is_empty() {
            return Err(DependencyError::MissingCoordinate("artifact_id"));
        }
        if self.version.is_empty() {
            return Err(DependencyError::MissingCoordinate("version"));
        }
        if self.system_path.is_some() && self.scope != DependencyScope::System {
            return Err(DependencyError::SystemPathScope(self.scope));
        }
        Ok(Dependency {
            group_id: self.group_id,
            artifact_id: self.artifact_id,
            version: self.version,
            dep_type: self.dep_type,
            classifier: self.classifier,
            scope: self.scope,
            optional: self.optional,
            system_path: self.system_path,
            exclusions: self.exclusions,
            declared_at: self.declared_at,
        })
    }
}
