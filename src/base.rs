//! The base build capability: compile units (source sets).
//!
//! With [`BasePlugin`] applied, every source set declared through
//! [`Project::add_source_set`] gets a compile dependency set and a compile
//! task. The compile task has no action of its own, consumers attach the
//! actual compiler with [`Project::compile_with`].

use crate::error::{ContainerError, ProjectError};
use crate::project::{Action, Plugin, Project, SourceSet, TaskDef};

pub struct BasePlugin;

impl BasePlugin {
    pub const ID: &'static str = "base";

    /// Applies the plugin unless it is already present.
    pub fn ensure(project: &mut Project) -> Result<(), ProjectError> {
        if !project.has_plugin(Self::ID) {
            project.apply(BasePlugin)?;
        }
        Ok(())
    }
}

impl Plugin for BasePlugin {
    type Output = ();

    fn id(&self) -> &'static str {
        Self::ID
    }

    fn apply(self, _: &mut Project) -> Result<(), ProjectError> {
        Ok(())
    }
}

impl Project {
    /// Declares a compile unit together with its compile dependency set and
    /// compile task.
    pub fn add_source_set(&mut self, name: &str) -> Result<&SourceSet, ProjectError> {
        if !self.has_plugin(BasePlugin::ID) {
            return Err(ProjectError::PluginMissing(BasePlugin::ID));
        }

        let set = SourceSet::new(name);
        let dependencies = set.compile_dependencies_name();
        let task = set.compile_task_name();

        // Check every name up front so that a conflict leaves nothing behind.
        if self.source_sets.contains(name) {
            return Err(duplicate("Source set", name));
        }
        if self.dependency_sets().find(&dependencies).is_some() {
            return Err(duplicate("Dependency set", &dependencies));
        }
        if self.tasks().find(&task).is_some() {
            return Err(ProjectError::DuplicateTask(task));
        }

        self.dependency_sets_mut()
            .create(&dependencies)?
            .set_description(format!("Compile dependencies for source set '{name}'."));

        self.tasks_mut().register(
            TaskDef::new(task)
                .group("Build")
                .description(format!("Compiles the '{name}' sources.")),
        )?;

        tracing::debug!(source_set = name, "declared source set");

        Ok(&*self.source_sets.create(name)?)
    }

    /// Attaches the compiler action to a source set's compile task.
    pub fn compile_with<A>(&mut self, source_set: &str, action: A) -> Result<(), ProjectError>
    where
        A: Action + 'static,
    {
        let task = self
            .source_set(source_set)
            .map(SourceSet::compile_task_name)
            .ok_or_else(|| ProjectError::TaskNotFound(format!("compile task of '{source_set}'")))?;

        self.tasks_mut().set_action(&task, action)
    }
}

fn duplicate(kind: &'static str, name: &str) -> ProjectError {
    ContainerError::Duplicate {
        kind,
        name: name.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Outcome, TaskContext};

    fn compile(_: &TaskContext<'_>) -> anyhow::Result<Outcome> {
        Ok(Outcome::Executed)
    }

    #[test]
    fn test_requires_base_plugin() {
        let mut project = Project::new("/work");
        assert!(matches!(
            project.add_source_set("main"),
            Err(ProjectError::PluginMissing("base"))
        ));
    }

    #[test]
    fn test_source_set_wiring() {
        let mut project = Project::new("/work");
        BasePlugin::ensure(&mut project).unwrap();
        BasePlugin::ensure(&mut project).unwrap();

        project.add_source_set("main").unwrap();
        project.add_source_set("test").unwrap();

        let task = project.tasks().find("compileMain").unwrap();
        assert_eq!(task.group(), Some("Build"));
        assert!(!task.has_action());
        assert!(project.tasks().find("compileTest").is_some());
        assert!(project.dependency_sets().find("compile").is_some());
        assert!(project.dependency_sets().find("testCompile").is_some());

        let names: Vec<_> = project.source_sets().map(SourceSet::name).collect();
        assert_eq!(names, vec!["main", "test"]);
    }

    #[test]
    fn test_duplicate_source_set() {
        let mut project = Project::new("/work");
        BasePlugin::ensure(&mut project).unwrap();
        project.add_source_set("main").unwrap();

        assert!(matches!(
            project.add_source_set("main"),
            Err(ProjectError::Container(ContainerError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_conflict_leaves_nothing_behind() {
        let mut project = Project::new("/work");
        BasePlugin::ensure(&mut project).unwrap();
        project.dependency_sets_mut().create("compile").unwrap();
        project.tasks_mut().register(TaskDef::new("compileTest")).unwrap();

        assert!(matches!(
            project.add_source_set("main"),
            Err(ProjectError::Container(ContainerError::Duplicate { .. }))
        ));
        assert!(matches!(
            project.add_source_set("test"),
            Err(ProjectError::DuplicateTask(task)) if task == "compileTest"
        ));

        assert!(project.source_set("main").is_none());
        assert!(project.source_set("test").is_none());
        assert!(project.tasks().find("compileMain").is_none());
        assert!(project.dependency_sets().find("testCompile").is_none());
    }

    #[test]
    fn test_compile_with() {
        let mut project = Project::new("/work");
        BasePlugin::ensure(&mut project).unwrap();
        project.add_source_set("main").unwrap();

        project.compile_with("main", compile).unwrap();

        assert!(project.tasks().find("compileMain").unwrap().has_action());
        assert!(project.compile_with("nope", compile).is_err());
    }
}
