use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::dependency::{Coordinate, ModuleId, ModuleVersion};
use crate::error::{CoordinateError, ResolveError};

/// A single dependency request as seen by resolution rules.
///
/// Rules may inspect the original request and override the version which is
/// going to be selected for it.
#[derive(Debug, Clone)]
pub struct ResolveDetails {
    requested: Coordinate,
    target: Option<String>,
    overridden: bool,
}

impl ResolveDetails {
    pub(crate) fn new(requested: Coordinate) -> Self {
        Self {
            target: requested.version.clone(),
            requested,
            overridden: false,
        }
    }

    /// The coordinate exactly as it was requested.
    pub fn requested(&self) -> &Coordinate {
        &self.requested
    }

    /// The version that will be selected unless another rule changes it.
    pub fn target_version(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Forces the version selected for this request.
    pub fn use_version(&mut self, version: impl Into<String>) {
        self.target = Some(version.into());
        self.overridden = true;
    }
}

/// Observer invoked for every dependency request while a set is resolved,
/// including transitive requests.
pub trait ResolutionRule: Send + Sync {
    fn apply(&self, details: &mut ResolveDetails);
}

impl<F> ResolutionRule for F
where
    F: Fn(&mut ResolveDetails) + Send + Sync,
{
    fn apply(&self, details: &mut ResolveDetails) {
        self(details)
    }
}

/// Source of module metadata used to discover transitive dependencies.
pub trait Catalog: Send + Sync {
    /// Direct dependencies of a module, or `None` if the module is unknown.
    fn dependencies(&self, module: &ModuleVersion) -> Option<Vec<Coordinate>>;
}

/// Every module exists and has no dependencies of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCatalog;

impl Catalog for DirectCatalog {
    fn dependencies(&self, _: &ModuleVersion) -> Option<Vec<Coordinate>> {
        Some(Vec::new())
    }
}

/// Catalog backed by an explicit table of published modules.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    modules: HashMap<ModuleVersion, Vec<Coordinate>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `module` (`group:name:version`) with the given dependencies.
    pub fn publish<I, S>(&mut self, module: &str, dependencies: I) -> Result<&mut Self, CoordinateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let module: ModuleVersion = module.parse()?;
        let dependencies = dependencies
            .into_iter()
            .map(|dep| dep.as_ref().parse())
            .collect::<Result<Vec<Coordinate>, _>>()?;

        self.modules.insert(module, dependencies);
        Ok(self)
    }
}

impl Catalog for MemoryCatalog {
    fn dependencies(&self, module: &ModuleVersion) -> Option<Vec<Coordinate>> {
        self.modules.get(module).cloned()
    }
}

/// A module picked by resolution together with the request that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub module: ModuleVersion,
    pub requested: Coordinate,
    /// Whether a rule changed the version that was requested.
    pub forced: bool,
}

/// The result of resolving a dependency set, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    modules: Vec<ResolvedModule>,
}

impl Resolution {
    pub fn modules(&self) -> &[ResolvedModule] {
        &self.modules
    }

    pub fn find(&self, group: &str, name: &str) -> Option<&ModuleVersion> {
        self.modules
            .iter()
            .map(|resolved| &resolved.module)
            .find(|module| module.id.group == group && module.id.name == name)
    }

    pub fn version_of(&self, group: &str, name: &str) -> Option<&str> {
        self.find(group, name).map(|module| module.version.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Breadth-first walk over the declared and transitive requests. The first
/// version selected for a module wins.
pub(crate) fn resolve(
    set: &str,
    declared: &[Coordinate],
    rules: &[Arc<dyn ResolutionRule>],
    catalog: &dyn Catalog,
) -> Result<Resolution, ResolveError> {
    let mut queue: VecDeque<Coordinate> = declared.iter().cloned().collect();
    let mut selected: HashMap<ModuleId, String> = HashMap::new();
    let mut modules = Vec::new();

    while let Some(request) = queue.pop_front() {
        let mut details = ResolveDetails::new(request);
        for rule in rules {
            rule.apply(&mut details);
        }

        let Some(version) = details.target.clone() else {
            return Err(ResolveError::MissingVersion {
                set: set.to_string(),
                request: details.requested.to_string(),
            });
        };

        if let Some(existing) = selected.get(&details.requested.id) {
            if *existing != version {
                tracing::debug!(
                    set,
                    module = %details.requested.id,
                    kept = %existing,
                    ignored = %version,
                    "version conflict, keeping first selection"
                );
            }
            continue;
        }

        let module = ModuleVersion::new(details.requested.id.clone(), version.clone());

        let transitive = catalog
            .dependencies(&module)
            .ok_or_else(|| ResolveError::NotFound {
                set: set.to_string(),
                module: module.to_string(),
            })?;

        selected.insert(module.id.clone(), version);
        queue.extend(transitive);

        modules.push(ResolvedModule {
            module,
            requested: details.requested,
            forced: details.overridden,
        });
    }

    Ok(Resolution { modules })
}
