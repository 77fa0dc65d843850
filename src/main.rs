use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use console::style;

use kata::manifest::{DEFAULT_MANIFEST, Manifest, Overrides};
use kata::{Project, utils};

/// Template code generation wired into a build task graph.
#[derive(Parser, Debug)]
#[command(name = "kata", version)]
struct Args {
    /// Path to the project manifest
    #[arg(long, short, default_value = DEFAULT_MANIFEST)]
    manifest: Utf8PathBuf,

    /// Version every generator module is pinned to
    #[arg(long, env = "KATA_GENERATOR_VERSION")]
    generator_version: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks by group
    Tasks,
    /// Print the task graph as a Mermaid flowchart
    Graph,
    /// Resolve a dependency set and print the selected modules
    Resolve {
        /// Name of the dependency set, e.g. `rockerCompiler`
        set: String,
    },
    /// Run tasks together with everything they depend on
    Run {
        #[arg(required = true)]
        tasks: Vec<String>,

        /// Write a Mermaid flowchart of the run, colored by task duration
        #[arg(long, value_name = "FILE")]
        mermaid: Option<Utf8PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    utils::init_logging()?;

    let args = Args::parse();

    let root = match args.manifest.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_owned(),
        _ => Utf8PathBuf::from("."),
    };
    let root = root.canonicalize_utf8().unwrap_or(root);

    let overrides = Overrides {
        generator_version: args.generator_version,
    };

    let (mut project, _) = Manifest::load(&args.manifest)?.into_project(root, &overrides)?;
    project.evaluate()?;

    match args.command {
        Command::Tasks => print_tasks(&project),
        Command::Graph => print!("{}", project.tasks()),
        Command::Resolve { set } => print_resolution(&project, &set)?,
        Command::Run { tasks, mermaid } => {
            let tasks: Vec<&str> = tasks.iter().map(String::as_str).collect();
            let diagnostics = project.execute(&tasks)?;
            eprint!("{diagnostics}");

            if let Some(path) = mermaid {
                std::fs::write(&path, diagnostics.render_mermaid(project.tasks()))
                    .with_context(|| format!("Couldn't write {path}"))?;
            }

            eprintln!("{}", style("BUILD SUCCESSFUL").green().bold());
        }
    }

    Ok(())
}

fn print_tasks(project: &Project) {
    let mut tasks: Vec<_> = project.tasks().iter().collect();
    tasks.sort_by_key(|task| (task.group().unwrap_or("Other"), task.name()));

    let mut current = None;
    for task in tasks {
        let group = task.group().unwrap_or("Other");
        if current != Some(group) {
            if current.is_some() {
                println!();
            }
            println!("{}", style(format!("{group} tasks")).bold());
            current = Some(group);
        }

        match task.description() {
            Some(description) => println!("{} - {description}", style(task.name()).cyan()),
            None => println!("{}", style(task.name()).cyan()),
        }
    }
}

fn print_resolution(project: &Project, set: &str) -> anyhow::Result<()> {
    let resolution = project.resolve(set)?;

    if let Some(description) = project.dependency_sets().find(set).and_then(|s| s.description()) {
        println!("{set} - {description}");
    }

    for resolved in resolution.modules() {
        let module = style(&resolved.module).cyan();
        if resolved.forced {
            println!("{module} {}", style(format!("(requested {})", resolved.requested)).dim());
        } else {
            println!("{module}");
        }
    }

    Ok(())
}
