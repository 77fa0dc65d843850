use std::process::ExitStatus;

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: &'static str, name: String },

    #[error("{kind} '{name}' cannot be declared or configured, the {kind} container is closed")]
    Closed { kind: &'static str, name: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("Malformed dependency notation '{0}', expected 'group:name[:version]'")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error("Cannot change dependencies of '{0}' after it has been resolved")]
    AlreadyResolved(String),

    #[error("Dependency set '{0}' not found")]
    SetNotFound(String),
}

/// Failures raised while resolving a dependency set. Cloneable because the
/// outcome of a resolution is cached and handed out to every reader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Dependency set '{0}' not found")]
    SetNotFound(String),

    #[error("Could not resolve '{request}' in '{set}': no version requested or selected")]
    MissingVersion { set: String, request: String },

    #[error("Could not resolve '{module}' in '{set}': module not found")]
    NotFound { set: String, module: String },
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error("Task '{0}' already exists")]
    DuplicateTask(String),

    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Plugin '{0}' has already been applied")]
    PluginAlreadyApplied(&'static str),

    #[error("Plugin '{0}' must be applied first")]
    PluginMissing(&'static str),

    #[error("Extension '{0}' not found or of a different type")]
    ExtensionNotFound(&'static str),

    #[error("Extension '{0}' already exists")]
    DuplicateExtension(&'static str),
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Couldn't locate artifact for '{0}'")]
    ArtifactNotFound(String),

    #[error("Couldn't compile glob pattern.\n{0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Couldn't walk templates.\n{0}")]
    Glob(#[from] glob::GlobError),

    #[error("Couldn't convert path to UTF-8.\n{0}")]
    PathFormat(#[from] camino::FromPathBufError),

    #[error("I/O error at '{0}':\n{1}")]
    Io(Utf8PathBuf, std::io::Error),

    #[error("Couldn't launch '{program}':\n{source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("Generator exited with {status}:\n{stderr}")]
    Exit { status: ExitStatus, stderr: String },
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("Cycle detected in task graph at '{0}'")]
    Cycle(String),

    #[error("Invalid progress template.\n{0}")]
    Style(#[from] indicatif::style::TemplateError),

    #[error("Task '{0}':\n{1}")]
    Task(String, anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Couldn't read manifest '{0}':\n{1}")]
    Read(Utf8PathBuf, std::io::Error),

    #[error("Couldn't parse manifest.\n{0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}
