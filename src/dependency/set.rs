use std::sync::{Arc, OnceLock};

use crate::container::NamedContainer;
use crate::dependency::Coordinate;
use crate::dependency::resolve::{Catalog, Resolution, ResolutionRule, resolve};
use crate::error::{ContainerError, DependencyError, ResolveError};

/// A named, resolvable set of dependencies, e.g. a compile classpath.
///
/// The set can be changed freely until it is resolved for the first time.
/// The resolution result is cached, so later changes to anything the rules
/// read (like a pinned version) do not affect it retroactively.
pub struct DependencySet {
    name: String,
    description: Option<String>,
    dependencies: Vec<Coordinate>,
    rules: Vec<Arc<dyn ResolutionRule>>,
    resolved: OnceLock<Result<Resolution, ResolveError>>,
}

impl DependencySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            dependencies: Vec::new(),
            rules: Vec::new(),
            resolved: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn dependencies(&self) -> &[Coordinate] {
        &self.dependencies
    }

    /// Declares a dependency using `group:name[:version]` notation. Adding a
    /// coordinate which is already declared is a no-op. Returns whether the
    /// set changed.
    pub fn add(&mut self, notation: &str) -> Result<bool, DependencyError> {
        let coordinate: Coordinate = notation.parse()?;
        self.add_coordinate(coordinate)
    }

    pub fn add_coordinate(&mut self, coordinate: Coordinate) -> Result<bool, DependencyError> {
        if self.is_resolved() {
            return Err(DependencyError::AlreadyResolved(self.name.clone()));
        }

        if self.dependencies.contains(&coordinate) {
            return Ok(false);
        }

        self.dependencies.push(coordinate);
        Ok(true)
    }

    /// Installs a rule which sees every request made while this set resolves.
    pub fn each_dependency(&mut self, rule: Arc<dyn ResolutionRule>) {
        self.rules.push(rule);
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolves the set against `catalog`, computing the result only once.
    pub fn resolve(&self, catalog: &dyn Catalog) -> Result<&Resolution, ResolveError> {
        let result = self.resolved.get_or_init(|| {
            let result = resolve(&self.name, &self.dependencies, &self.rules, catalog);
            match &result {
                Ok(resolution) => {
                    tracing::debug!(set = %self.name, modules = resolution.len(), "resolved")
                }
                Err(err) => tracing::debug!(set = %self.name, "resolution failed: {err}"),
            }
            result
        });

        result.as_ref().map_err(Clone::clone)
    }
}

impl std::fmt::Debug for DependencySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencySet")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("rules", &self.rules.len())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// The container of every dependency set in a project.
pub struct DependencySets {
    sets: NamedContainer<DependencySet>,
}

impl DependencySets {
    pub fn new() -> Self {
        Self {
            sets: NamedContainer::new("Dependency set", |name| DependencySet::new(name)),
        }
    }

    pub fn create(&mut self, name: &str) -> Result<&mut DependencySet, ContainerError> {
        self.sets.create(name)
    }

    pub fn maybe_create(&mut self, name: &str) -> Result<&mut DependencySet, ContainerError> {
        self.sets.maybe_create(name)
    }

    pub fn find(&self, name: &str) -> Option<&DependencySet> {
        self.sets.find(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut DependencySet> {
        self.sets.find_mut(name)
    }

    /// Adds a dependency to an existing set.
    pub fn add(&mut self, set: &str, notation: &str) -> Result<bool, DependencyError> {
        self.sets
            .find_mut(set)
            .ok_or_else(|| DependencyError::SetNotFound(set.to_string()))?
            .add(notation)
    }

    /// Installs `rule` on every set that exists now and every set created
    /// later.
    pub fn each_dependency(&mut self, rule: Arc<dyn ResolutionRule>) {
        self.sets.all(move |set| set.each_dependency(rule.clone()));
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencySet> {
        self.sets.iter().map(|(_, set)| set)
    }

    pub fn resolve(&self, name: &str, catalog: &dyn Catalog) -> Result<&Resolution, ResolveError> {
        self.sets
            .find(name)
            .ok_or_else(|| ResolveError::SetNotFound(name.to_string()))?
            .resolve(catalog)
    }
}

impl Default for DependencySets {
    fn default() -> Self {
        Self::new()
    }
}
