//! The build definition: tasks, compile units, dependency sets and plugins.
//!
//! A [`Project`] goes through two phases. While it is being *configured*,
//! plugins are applied and domain objects are declared. Calling
//! [`Project::evaluate`] closes the declaration phase and runs the hooks
//! registered with [`Project::after_evaluate`], which is where plugins turn
//! declarations into tasks. After that the project is executed, see
//! [`Project::execute`].

mod source_set;
mod task;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::container::NamedContainer;
use crate::dependency::{Catalog, DependencySets, DirectCatalog, Resolution};
use crate::error::{BuildError, ProjectError, ResolveError};
use crate::executor::Diagnostics;

pub use source_set::SourceSet;
pub use task::{Action, Outcome, Task, TaskContext, TaskDef, TaskGraph, TaskHandle};

/// A unit of reusable build logic.
pub trait Plugin {
    /// Whatever the plugin hands back to the build script once applied.
    type Output;

    /// Stable identifier, a plugin can be applied to a project only once.
    fn id(&self) -> &'static str;

    fn apply(self, project: &mut Project) -> Result<Self::Output, ProjectError>;
}

type EvaluateHook = Box<dyn FnOnce(&mut Project) -> Result<(), ProjectError> + Send + Sync>;

pub struct Project {
    root: Utf8PathBuf,
    build_dir: Utf8PathBuf,
    tasks: TaskGraph,
    pub(crate) source_sets: NamedContainer<SourceSet>,
    dependency_sets: DependencySets,
    catalog: Arc<dyn Catalog>,
    extensions: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    plugins: Vec<&'static str>,
    hooks: Vec<EvaluateHook>,
    evaluated: bool,
}

impl Project {
    /// Creates an empty project rooted at `root`, building into `root/build`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();

        Self {
            build_dir: root.join("build"),
            root,
            tasks: TaskGraph::new(),
            source_sets: NamedContainer::new("Source set", |name| SourceSet::new(name)),
            dependency_sets: DependencySets::new(),
            catalog: Arc::new(DirectCatalog),
            extensions: HashMap::new(),
            plugins: Vec::new(),
            hooks: Vec::new(),
            evaluated: false,
        }
    }

    /// Replaces the module catalog used to discover transitive dependencies.
    pub fn with_catalog(mut self, catalog: impl Catalog + 'static) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn set_build_dir(&mut self, build_dir: impl Into<Utf8PathBuf>) {
        let build_dir = build_dir.into();
        self.build_dir = if build_dir.is_absolute() {
            build_dir
        } else {
            self.root.join(build_dir)
        };
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn build_dir(&self) -> &Utf8Path {
        &self.build_dir
    }

    /// Resolves `path` against the project root unless it is absolute.
    pub fn file(&self, path: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn tasks(&self) -> &TaskGraph {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskGraph {
        &mut self.tasks
    }

    pub fn source_sets(&self) -> impl Iterator<Item = &SourceSet> {
        self.source_sets.iter().map(|(_, set)| set)
    }

    pub fn source_set(&self, name: &str) -> Option<&SourceSet> {
        self.source_sets.find(name)
    }

    pub fn dependency_sets(&self) -> &DependencySets {
        &self.dependency_sets
    }

    pub fn dependency_sets_mut(&mut self) -> &mut DependencySets {
        &mut self.dependency_sets
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Resolves the named dependency set, see [`crate::DependencySet::resolve`].
    pub fn resolve(&self, set: &str) -> Result<&Resolution, ResolveError> {
        self.dependency_sets.resolve(set, self.catalog.as_ref())
    }

    /// Applies a plugin, failing if a plugin with the same id was already
    /// applied.
    pub fn apply<P: Plugin>(&mut self, plugin: P) -> Result<P::Output, ProjectError> {
        let id = plugin.id();
        if self.has_plugin(id) {
            return Err(ProjectError::PluginAlreadyApplied(id));
        }

        tracing::debug!(plugin = id, "applying plugin");
        self.plugins.push(id);
        plugin.apply(self)
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.iter().any(|applied| *applied == id)
    }

    /// Registers a typed extension object under `name`.
    pub fn add_extension<T>(&mut self, name: &'static str, value: T) -> Result<(), ProjectError>
    where
        T: Any + Send + Sync,
    {
        if self.extensions.contains_key(name) {
            return Err(ProjectError::DuplicateExtension(name));
        }

        self.extensions.insert(name, Box::new(value));
        Ok(())
    }

    pub fn extension<T: Any>(&self, name: &'static str) -> Result<&T, ProjectError> {
        self.extensions
            .get(name)
            .and_then(|ext| ext.downcast_ref::<T>())
            .ok_or(ProjectError::ExtensionNotFound(name))
    }

    pub fn extension_mut<T: Any>(&mut self, name: &'static str) -> Result<&mut T, ProjectError> {
        self.extensions
            .get_mut(name)
            .and_then(|ext| ext.downcast_mut::<T>())
            .ok_or(ProjectError::ExtensionNotFound(name))
    }

    /// Registers a hook which runs once the declaration phase is over.
    pub fn after_evaluate<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut Project) -> Result<(), ProjectError> + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Closes the declaration phase and runs the after-evaluate hooks in the
    /// order they were registered. Calling it again does nothing.
    pub fn evaluate(&mut self) -> Result<(), ProjectError> {
        if self.evaluated {
            return Ok(());
        }

        self.evaluated = true;

        while !self.hooks.is_empty() {
            let hooks = std::mem::take(&mut self.hooks);
            for hook in hooks {
                hook(self)?;
            }
        }

        tracing::debug!(tasks = self.tasks.len(), "project evaluated");
        Ok(())
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Evaluates the project if needed and runs the named tasks together with
    /// everything they depend on.
    pub fn execute(&mut self, tasks: &[&str]) -> Result<Diagnostics, BuildError> {
        self.evaluate()?;
        crate::executor::run(self, tasks)
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("root", &self.root)
            .field("build_dir", &self.build_dir)
            .field("tasks", &self.tasks.len())
            .field("plugins", &self.plugins)
            .field("evaluated", &self.evaluated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Marker;

    impl Plugin for Marker {
        type Output = &'static str;

        fn id(&self) -> &'static str {
            "marker"
        }

        fn apply(self, project: &mut Project) -> Result<Self::Output, ProjectError> {
            project.tasks_mut().register(TaskDef::new("mark"))?;
            Ok("applied")
        }
    }

    #[test]
    fn test_plugin_applies_once() {
        let mut project = Project::new("/work");
        assert_eq!(project.apply(Marker).unwrap(), "applied");
        assert!(project.has_plugin("marker"));
        assert!(matches!(
            project.apply(Marker),
            Err(ProjectError::PluginAlreadyApplied("marker"))
        ));
    }

    #[test]
    fn test_paths() {
        let mut project = Project::new("/work");
        assert_eq!(project.build_dir(), "/work/build");
        assert_eq!(project.file("src/a"), "/work/src/a");
        assert_eq!(project.file("/abs"), "/abs");

        project.set_build_dir("out");
        assert_eq!(project.build_dir(), "/work/out");
    }

    #[test]
    fn test_extensions_are_typed() {
        let mut project = Project::new("/work");
        project.add_extension("count", 41_u32).unwrap();

        *project.extension_mut::<u32>("count").unwrap() += 1;
        assert_eq!(*project.extension::<u32>("count").unwrap(), 42);
        assert!(project.extension::<String>("count").is_err());
        assert!(matches!(
            project.add_extension("count", 0_u32),
            Err(ProjectError::DuplicateExtension("count"))
        ));
    }

    #[test]
    fn test_hooks_run_once_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut project = Project::new("/work");

        for i in 0..3 {
            let log = log.clone();
            project.after_evaluate(move |_| {
                log.lock().unwrap().push(i);
                Ok(())
            });
        }

        let nested = log.clone();
        project.after_evaluate(move |project| {
            project.after_evaluate(move |_| {
                nested.lock().unwrap().push(99);
                Ok(())
            });
            Ok(())
        });

        project.evaluate().unwrap();
        project.evaluate().unwrap();

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 99]);
        assert!(project.is_evaluated());
    }

    #[test]
    fn test_hook_failure_aborts_evaluation() {
        let mut project = Project::new("/work");
        project.tasks_mut().register(TaskDef::new("taken")).unwrap();
        project.after_evaluate(|project| {
            project.tasks_mut().register(TaskDef::new("taken"))?;
            Ok(())
        });

        assert!(matches!(
            project.evaluate(),
            Err(ProjectError::DuplicateTask(name)) if name == "taken"
        ));
    }
}
