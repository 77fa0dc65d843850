mod diagnostics;

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::time::{Duration, Instant};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use rayon::Yield;
use tracing::Level;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::Project;
use crate::error::BuildError;
use crate::project::{Outcome, TaskContext};

pub use diagnostics::{Diagnostics, TaskExecution};

/// Runs the requested tasks of an evaluated project, together with every
/// task they transitively depend on.
///
/// Tasks are scheduled on the rayon pool as soon as all of their
/// dependencies have finished:
/// 1. The dependency closure of the requested tasks is collected.
/// 2. Tasks with no pending dependencies are spawned.
/// 3. The calling thread waits for results on a channel and, for each
///    finished task, decrements the dependency counts of its dependents.
/// 4. A dependent whose count reaches zero is spawned right away.
///
/// The first failing task stops the scheduling of new work, tasks already
/// running are allowed to finish.
pub(crate) fn run(project: &Project, requested: &[&str]) -> Result<Diagnostics, BuildError> {
    let tasks = project.tasks();
    let graph = &tasks.graph;

    let mut roots = Vec::with_capacity(requested.len());
    for name in requested {
        roots.push(tasks.lookup(name)?);
    }

    // We run toposort primarily to detect any cycles in the graph.
    petgraph::algo::toposort(graph, None)
        .map_err(|cycle| BuildError::Cycle(graph[cycle.node_id()].name().to_string()))?;

    let nodes_to_run = collect_closure(project, &roots);

    // Build a map from a dependency to the nodes that depend on it.
    let mut dependents: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
    for edge in graph.raw_edges() {
        if nodes_to_run.contains(&edge.target()) {
            dependents
                .entry(edge.source())
                .or_default()
                .push(edge.target());
        }
    }

    let mut dependency_counts: HashMap<NodeIndex, usize> = nodes_to_run
        .iter()
        .map(|&i| (i, graph.neighbors_directed(i, Direction::Incoming).count()))
        .collect();

    let total_tasks = nodes_to_run.len() as u64;
    let mut completed_tasks = 0;

    if total_tasks == 0 {
        return Ok(Diagnostics::default());
    }

    let root_span = tracing::span!(Level::INFO, "running_tasks");
    root_span.pb_set_length(total_tasks);
    root_span.pb_set_style(&crate::utils::get_style_build()?);
    root_span.pb_set_message("Running tasks...");
    let _enter = root_span.enter();

    let mut executions = HashMap::new();

    // regular task style with no progress
    let pb_style = crate::utils::get_style_task()?;

    // The receive loop stays on the calling thread, so a pool with a single
    // worker still has that worker free for the spawned tasks.
    rayon::in_place_scope(|s| -> Result<(), BuildError> {
        // (index, result, start, duration)
        let (result_sender, result_receiver) =
            channel::<(NodeIndex, anyhow::Result<Outcome>, Instant, Duration)>();

        let spawn_task = |index: NodeIndex| {
            let task = graph[index].clone();
            let sender = result_sender.clone();
            let pb_style = pb_style.clone();

            s.spawn(move |_| {
                let span = tracing::span!(Level::INFO, "task", name = task.name());
                span.pb_set_style(&pb_style);
                span.pb_set_message(&format!("Running {}", task.name()));
                let _enter = span.enter();

                let context = TaskContext {
                    name: task.name(),
                    project,
                    span: span.clone(),
                };

                let start_time = Instant::now();

                // A panicking action only has read access to the project, so
                // nothing shared is left half-updated.
                let output = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    task.run(&context)
                })) {
                    Ok(result) => result,
                    Err(panic) => {
                        let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                            format!("Task panicked: {s}")
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            format!("Task panicked: {s}")
                        } else {
                            String::from("Task panicked with unknown payload")
                        };

                        Err(anyhow::anyhow!(msg))
                    }
                };

                let elapsed = start_time.elapsed();

                // The receiver is gone only if the build already failed.
                let _ = sender.send((index, output, start_time, elapsed));
            });
        };

        // Seed initial tasks in registration order
        let mut seeds: Vec<NodeIndex> = nodes_to_run
            .iter()
            .copied()
            .filter(|i| dependency_counts.get(i).copied().unwrap_or(0) == 0)
            .collect();
        seeds.sort_unstable();
        for index in seeds {
            spawn_task(index);
        }

        while completed_tasks < total_tasks {
            let Some((completed_index, output, start, duration)) = receive(&result_receiver)
            else {
                break;
            };

            let name = graph[completed_index].name();
            let outcome = output.map_err(|e| BuildError::Task(name.to_string(), e))?;

            tracing::info!(task = name, %outcome, "finished in {duration:.2?}");

            executions.insert(
                completed_index,
                TaskExecution {
                    name: name.to_string(),
                    outcome,
                    start,
                    duration,
                },
            );
            completed_tasks += 1;
            root_span.pb_inc(1);

            // Unlock dependents
            if let Some(dependents_of_completed) = dependents.get(&completed_index) {
                for &index in dependents_of_completed {
                    if let Some(count) = dependency_counts.get_mut(&index) {
                        *count -= 1;
                        if *count == 0 {
                            spawn_task(index);
                        }
                    }
                }
            }
        }

        Ok(())
    })?;

    tracing::info!("Build complete!");
    Ok(Diagnostics { executions })
}

/// Waits for the next message. When called from inside a rayon pool, pending
/// jobs of that pool are run while waiting instead of blocking the worker.
fn receive<T>(receiver: &Receiver<T>) -> Option<T> {
    loop {
        match receiver.try_recv() {
            Ok(message) => return Some(message),
            Err(TryRecvError::Disconnected) => return None,
            Err(TryRecvError::Empty) => match rayon::yield_now() {
                Some(Yield::Executed) => {}
                Some(Yield::Idle) => {
                    if let Ok(message) = receiver.recv_timeout(Duration::from_millis(1)) {
                        return Some(message);
                    }
                }
                None => return receiver.recv().ok(),
            },
        }
    }
}

/// The requested tasks plus everything reachable from them against the edge
/// direction, i.e. all of their transitive dependencies.
fn collect_closure(project: &Project, roots: &[NodeIndex]) -> HashSet<NodeIndex> {
    let graph = &project.tasks().graph;
    let mut seen = HashSet::new();
    let mut stack = roots.to_vec();

    while let Some(index) = stack.pop() {
        if seen.insert(index) {
            stack.extend(graph.neighbors_directed(index, Direction::Incoming));
        }
    }

    seen
}
