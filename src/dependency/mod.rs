//! Dependency declarations and their resolution.
//!
//! Dependencies are written in the usual `group:name[:version]` notation. A
//! [`DependencySet`] collects declared coordinates, and resolving it walks the
//! transitive graph described by a [`Catalog`], passing every request through
//! the [`ResolutionRule`]s installed on the set.

mod resolve;
mod set;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::CoordinateError;

pub use resolve::{
    Catalog, DirectCatalog, MemoryCatalog, Resolution, ResolutionRule, ResolveDetails,
    ResolvedModule,
};
pub use set::{DependencySet, DependencySets};

/// Identity of a module regardless of its version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    pub group: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A concrete module at a concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleVersion {
    pub id: ModuleId,
    pub version: String,
}

impl ModuleVersion {
    pub fn new(id: ModuleId, version: impl Into<String>) -> Self {
        Self {
            id,
            version: version.into(),
        }
    }
}

impl Display for ModuleVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.version)
    }
}

impl FromStr for ModuleVersion {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coordinate: Coordinate = s.parse()?;
        match coordinate.version {
            Some(version) => Ok(ModuleVersion::new(coordinate.id, version)),
            None => Err(CoordinateError::Malformed(s.to_string())),
        }
    }
}

/// A dependency request: a module and, optionally, the version asked for.
///
/// Coordinates without a version are legal; something in the resolution
/// process (usually a [`ResolutionRule`]) has to pick the version for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub id: ModuleId,
    pub version: Option<String>,
}

impl Coordinate {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ModuleId::new(group, name),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn group(&self) -> &str {
        &self.id.group
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}", self.id, version),
            None => write!(f, "{}", self.id),
        }
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();

        if parts.iter().any(|part| part.trim().is_empty()) {
            return Err(CoordinateError::Malformed(s.to_string()));
        }

        match parts.as_slice() {
            [group, name] => Ok(Coordinate::new(*group, *name)),
            [group, name, version] => Ok(Coordinate::new(*group, *name).with_version(*version)),
            _ => Err(CoordinateError::Malformed(s.to_string())),
        }
    }
}

impl From<ModuleVersion> for Coordinate {
    fn from(module: ModuleVersion) -> Self {
        Coordinate {
            id: module.id,
            version: Some(module.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notation() {
        let c: Coordinate = "com.fizzed:rocker-runtime".parse().unwrap();
        assert_eq!(c.group(), "com.fizzed");
        assert_eq!(c.name(), "rocker-runtime");
        assert_eq!(c.version, None);

        let c: Coordinate = "org.slf4j:slf4j-simple:1.7.23".parse().unwrap();
        assert_eq!(c.version.as_deref(), Some("1.7.23"));
        assert_eq!(c.to_string(), "org.slf4j:slf4j-simple:1.7.23");
    }

    #[test]
    fn test_parse_malformed() {
        for bad in ["", "lonely", "a::b", "a:b:c:d", ":b", "a:"] {
            assert!(bad.parse::<Coordinate>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_module_version_requires_version() {
        assert!("a:b".parse::<ModuleVersion>().is_err());

        let m: ModuleVersion = "a:b:1.0".parse().unwrap();
        assert_eq!(m.to_string(), "a:b:1.0");
    }
}
