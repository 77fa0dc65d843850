use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{Graph, NodeIndex};

use crate::Project;
use crate::dependency::Resolution;
use crate::error::{ProjectError, ResolveError};

/// How a task finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The task did its work.
    Executed,
    /// Inputs did not change since the last run, nothing was done.
    UpToDate,
    /// The task had no inputs to work on.
    NoSource,
    /// The task has no action attached, it only groups its dependencies.
    NoAction,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Outcome::Executed => "EXECUTED",
            Outcome::UpToDate => "UP-TO-DATE",
            Outcome::NoSource => "NO-SOURCE",
            Outcome::NoAction => "NO-ACTION",
        };
        f.pad(label)
    }
}

/// The context passed to every task action.
///
/// Actions get read-only access to the evaluated project, which is enough to
/// resolve dependency sets and find the build directory.
pub struct TaskContext<'a> {
    /// Name of the running task.
    pub name: &'a str,
    /// The evaluated project.
    pub project: &'a Project,
    /// Tracing span assigned to this task.
    pub(crate) span: tracing::Span,
}

impl<'a> TaskContext<'a> {
    pub fn resolve(&self, set: &str) -> Result<&'a Resolution, ResolveError> {
        self.project.resolve(set)
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

/// The work a task performs when it runs.
pub trait Action: Send + Sync {
    fn execute(&self, context: &TaskContext<'_>) -> anyhow::Result<Outcome>;
}

impl<F> Action for F
where
    F: Fn(&TaskContext<'_>) -> anyhow::Result<Outcome> + Send + Sync,
{
    fn execute(&self, context: &TaskContext<'_>) -> anyhow::Result<Outcome> {
        self(context)
    }
}

/// A task node in the project's graph.
#[derive(Clone)]
pub struct Task {
    name: String,
    group: Option<String>,
    description: Option<String>,
    action: Option<Arc<dyn Action>>,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn run(&self, context: &TaskContext<'_>) -> anyhow::Result<Outcome> {
        match &self.action {
            Some(action) => action.execute(context),
            None => Ok(Outcome::NoAction),
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("description", &self.description)
            .field("action", &self.action.as_ref().map(|_| "*"))
            .finish()
    }
}

/// Builder for a task which has not been registered yet.
pub struct TaskDef {
    task: Task,
}

impl TaskDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            task: Task {
                name: name.into(),
                group: None,
                description: None,
                action: None,
            },
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.task.group = Some(group.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.task.description = Some(description.into());
        self
    }

    pub fn action<A>(mut self, action: A) -> Self
    where
        A: Action + 'static,
    {
        self.task.action = Some(Arc::new(action));
        self
    }

    /// Attaches a closure as the task's action.
    pub fn run<F>(self, callback: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        self.action(callback)
    }
}

/// A lightweight reference to a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub(crate) index: NodeIndex,
}

impl TaskHandle {
    /// Returns the underlying `NodeIndex` of the task in the graph.
    pub fn index(&self) -> NodeIndex {
        self.index
    }
}

/// The task graph of a project.
///
/// Edges point from a dependency to the task which depends on it, so a
/// topological order of the graph is a valid execution order.
#[derive(Default)]
pub struct TaskGraph {
    pub(crate) graph: Graph<Task, ()>,
    index: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: TaskDef) -> Result<TaskHandle, ProjectError> {
        let task = def.task;
        if self.index.contains_key(&task.name) {
            return Err(ProjectError::DuplicateTask(task.name));
        }

        let name = task.name.clone();
        let index = self.graph.add_node(task);
        self.index.insert(name, index);

        Ok(TaskHandle { index })
    }

    pub fn handle(&self, name: &str) -> Option<TaskHandle> {
        self.index.get(name).map(|&index| TaskHandle { index })
    }

    pub fn find(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&index| &self.graph[index])
    }

    pub fn get(&self, handle: TaskHandle) -> &Task {
        &self.graph[handle.index]
    }

    /// Attaches (or replaces) the action of an already registered task.
    pub fn set_action<A>(&mut self, name: &str, action: A) -> Result<(), ProjectError>
    where
        A: Action + 'static,
    {
        let index = self.lookup(name)?;
        self.graph[index].action = Some(Arc::new(action));
        Ok(())
    }

    /// Declares that `task` cannot start before `dependency` has finished.
    /// Declaring the same edge twice has no further effect.
    pub fn depends_on(&mut self, task: &str, dependency: &str) -> Result<(), ProjectError> {
        let task = self.lookup(task)?;
        let dependency = self.lookup(dependency)?;
        self.graph.update_edge(dependency, task, ());
        Ok(())
    }

    /// Names of the tasks `name` directly depends on.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Names of the tasks which directly depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Task names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(Task::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.graph.node_indices().map(|index| &self.graph[index])
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<NodeIndex, ProjectError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| ProjectError::TaskNotFound(name.to_string()))
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&index) = self.index.get(name) else {
            return vec![];
        };

        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|i| self.graph[i].name())
            .collect();

        names.sort_unstable();
        names
    }
}

/// Renders the graph as a Mermaid flowchart.
impl Display for TaskGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph LR")?;

        for index in self.graph.node_indices() {
            let task = &self.graph[index];
            let name = task.name().replace('"', "\\\"");
            writeln!(f, "    {}[\"{}\"]", index.index(), name)?;
        }

        for edge in self.graph.raw_edges() {
            writeln!(
                f,
                "    {} --> {}",
                edge.source().index(),
                edge.target().index()
            )?;
        }

        Ok(())
    }
}
