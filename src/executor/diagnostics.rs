use std::collections::HashMap;
use std::fmt::{Display, Formatter, Write};
use std::time::{Duration, Instant};

use petgraph::graph::NodeIndex;

use crate::project::{Outcome, TaskGraph};

/// How a single task went.
#[derive(Debug, Clone)]
pub struct TaskExecution {
    pub name: String,
    pub outcome: Outcome,
    pub start: Instant,
    pub duration: Duration,
}

/// Build diagnostics returned by [`crate::Project::execute`].
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// A map of task node indices to their execution metrics.
    pub executions: HashMap<NodeIndex, TaskExecution>,
}

impl Diagnostics {
    pub fn outcome(&self, task: &str) -> Option<Outcome> {
        self.get(task).map(|exec| exec.outcome)
    }

    pub fn get(&self, task: &str) -> Option<&TaskExecution> {
        self.executions.values().find(|exec| exec.name == task)
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// Executions ordered by the moment they started.
    pub fn timeline(&self) -> Vec<&TaskExecution> {
        let mut ran: Vec<_> = self.executions.values().collect();
        ran.sort_by_key(|exec| exec.start);
        ran
    }

    /// Renders the task graph as a Mermaid diagram, color-coded by execution duration.
    ///
    /// * **Green**: Fast
    /// * **Yellow**: Moderate
    /// * **Red**: Slow
    /// * **Blue**: Not part of this build
    pub fn render_mermaid(&self, tasks: &TaskGraph) -> String {
        let mut f = String::new();
        let _ = self.write_mermaid(&mut f, tasks);
        f
    }

    fn write_mermaid(&self, f: &mut String, tasks: &TaskGraph) -> std::fmt::Result {
        writeln!(f, "graph LR")?;

        let times = &self.executions;
        let mut min_time = f64::MAX;
        let mut max_time = f64::MIN;

        for t in times.values() {
            let secs = t.duration.as_secs_f64();
            min_time = min_time.min(secs);
            max_time = max_time.max(secs);
        }

        if min_time > max_time {
            // No tasks ran
            min_time = 0.0;
            max_time = 0.0;
        }

        // Avoid divide by zero if all tasks took same time
        if (max_time - min_time).abs() < f64::EPSILON {
            max_time = min_time + 1.0;
        }

        let graph = &tasks.graph;

        for index in graph.node_indices() {
            let name = graph[index].name().replace('"', "\\\"");

            let (label_extra, color_code) = if let Some(exec) = times.get(&index) {
                let t = (exec.duration.as_secs_f64() - min_time) / (max_time - min_time);
                let label = format!("{} {:.2?}", exec.outcome, exec.duration);
                (label, heat(t))
            } else {
                ("Skipped".to_string(), "#ADD8E6".to_string())
            };

            writeln!(f, "    {}[\"{}\\n{}\"]", index.index(), name, label_extra)?;
            writeln!(f, "    style {} fill:{}", index.index(), color_code)?;
        }

        for edge in graph.raw_edges() {
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

/// Green at 0.0, yellow at 0.5, red at 1.0.
fn heat(t: f64) -> String {
    let (r, g) = if t < 0.5 {
        ((255.0 * t * 2.0) as u8, 255)
    } else {
        (255, (255.0 * (1.0 - (t - 0.5) * 2.0)) as u8)
    };

    format!("#{r:02X}{g:02X}00")
}

/// One line per task, in the order the tasks started.
impl Display for Diagnostics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for exec in self.timeline() {
            writeln!(
                f,
                "{:<40} {:<10} {:>10.2?}",
                exec.name, exec.outcome, exec.duration
            )?;
        }
        Ok(())
    }
}
