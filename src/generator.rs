//! Template code generation wired into the task graph.
//!
//! Applying a [`GeneratorPlugin`] to a [`Project`]:
//! 1. applies the base plugin so that source sets are available,
//! 2. pins every module of the generator family to one version on every
//!    current and future dependency set,
//! 3. registers the container of [`GenerationConfig`]s as a project
//!    extension,
//! 4. provisions the [`RuntimeClasspath`] used to invoke the compiler.
//!
//! When the project is evaluated, each configuration becomes a generation
//! task. If a source set with the same name exists, its compile task is made
//! to depend on the generation task and its compile dependencies receive the
//! runtime support library.
//!
//! ```no_run
//! use kata::{BasePlugin, GeneratorPlugin, Project};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut project = Project::new("/work/app");
//! project.apply(BasePlugin)?;
//! project.add_source_set("main")?;
//!
//! let rocker = project.apply(GeneratorPlugin::rocker())?;
//! rocker.pin().set("0.17.0");
//! rocker.configure(&mut project, "main", |config| {
//!     config.set_option("optimize", "true");
//! })?;
//!
//! project.execute(&["compileMain"])?;
//! # Ok(())
//! # }
//! ```

mod classpath;
mod config;
mod family;
mod launcher;
mod task;
mod version;

use std::sync::Arc;

use crate::base::BasePlugin;
use crate::error::ProjectError;
use crate::project::{Plugin, Project, TaskDef};

pub use classpath::RuntimeClasspath;
pub use config::{GenerationConfig, GenerationConfigs};
pub use family::GeneratorFamily;
pub use launcher::{ArtifactLocator, Invocation, JavaLauncher, Launcher, MavenLocal};
pub use task::GenerationTask;
pub use version::{VersionEnforcer, VersionPin};

/// Plugin wiring one template generator into a project.
pub struct GeneratorPlugin {
    family: GeneratorFamily,
    version: Option<String>,
    launcher: Arc<dyn Launcher>,
    locator: Arc<dyn ArtifactLocator>,
}

impl GeneratorPlugin {
    pub fn new(family: GeneratorFamily) -> Self {
        Self {
            family,
            version: None,
            launcher: Arc::new(JavaLauncher::new()),
            locator: Arc::new(MavenLocal::default()),
        }
    }

    pub fn rocker() -> Self {
        Self::new(GeneratorFamily::rocker())
    }

    /// Initial value of the version pin, instead of the family default.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_launcher<L: Launcher + 'static>(mut self, launcher: L) -> Self {
        self.launcher = Arc::new(launcher);
        self
    }

    pub fn with_locator<A: ArtifactLocator + 'static>(mut self, locator: A) -> Self {
        self.locator = Arc::new(locator);
        self
    }
}

impl Plugin for GeneratorPlugin {
    type Output = Generator;

    fn id(&self) -> &'static str {
        self.family.name
    }

    fn apply(self, project: &mut Project) -> Result<Generator, ProjectError> {
        let family = self.family;

        BasePlugin::ensure(project)?;

        let version = self.version.unwrap_or_else(|| family.default_version.to_string());
        let pin = VersionPin::new(version);
        project
            .dependency_sets_mut()
            .each_dependency(Arc::new(VersionEnforcer::new(family, pin.clone())));

        let configs = GenerationConfig::container(
            family,
            project.root().to_owned(),
            project.build_dir().to_owned(),
        );
        project.add_extension(family.name, configs)?;

        let classpath = RuntimeClasspath::provision(project, &family)?;

        let registrar = Registrar {
            family,
            classpath,
            launcher: self.launcher,
            locator: self.locator,
        };
        project.after_evaluate(move |project| registrar.register_all(project));

        tracing::debug!(family = family.name, version = %pin.get(), "generator applied");

        Ok(Generator {
            family,
            pin,
            classpath,
        })
    }
}

/// What the build script gets back from applying a [`GeneratorPlugin`].
#[derive(Debug, Clone)]
pub struct Generator {
    family: GeneratorFamily,
    pin: VersionPin,
    classpath: RuntimeClasspath,
}

impl Generator {
    pub fn family(&self) -> &GeneratorFamily {
        &self.family
    }

    pub fn pin(&self) -> &VersionPin {
        &self.pin
    }

    pub fn classpath(&self) -> RuntimeClasspath {
        self.classpath
    }

    /// Declares (on first reference) and configures the named generation
    /// config. Fails once the project has been evaluated.
    pub fn configure<F>(&self, project: &mut Project, name: &str, f: F) -> Result<(), ProjectError>
    where
        F: FnOnce(&mut GenerationConfig),
    {
        project
            .extension_mut::<GenerationConfigs>(self.family.name)?
            .configure(name, f)?;
        Ok(())
    }

    pub fn configs<'a>(&self, project: &'a Project) -> Result<&'a GenerationConfigs, ProjectError> {
        project.extension::<GenerationConfigs>(self.family.name)
    }

    /// Name of the task generated for the named config.
    pub fn task_name(&self, config: &str) -> String {
        self.family.task_name(config)
    }
}

/// Turns the declared configurations into tasks once the project is
/// evaluated.
struct Registrar {
    family: GeneratorFamily,
    classpath: RuntimeClasspath,
    launcher: Arc<dyn Launcher>,
    locator: Arc<dyn ArtifactLocator>,
}

impl Registrar {
    fn register_all(self, project: &mut Project) -> Result<(), ProjectError> {
        let root = project.root().to_owned();

        let configs = project.extension_mut::<GenerationConfigs>(self.family.name)?;
        configs.close();

        let frozen: Vec<Arc<GenerationConfig>> = configs
            .iter()
            .map(|(_, config)| Arc::new(config.clone().anchored(&root)))
            .collect();

        for config in frozen {
            self.register(project, config)?;
        }

        Ok(())
    }

    fn register(&self, project: &mut Project, config: Arc<GenerationConfig>) -> Result<(), ProjectError> {
        let family = &self.family;
        let name = family.task_name(config.name());
        let source_set = config.name().to_string();

        let action = GenerationTask {
            family: *family,
            config,
            classpath: self.classpath,
            launcher: self.launcher.clone(),
            locator: self.locator.clone(),
        };

        project.tasks_mut().register(
            TaskDef::new(name.clone())
                .group(family.display_name)
                .description(family.task_description)
                .action(action),
        )?;

        tracing::info!(task = %name, "registered generation task");

        link_source_set(project, family, &source_set, &name)?;
        Ok(())
    }
}

/// Makes the compile task of `source_set` depend on `task` and puts the
/// runtime support library on its compile dependencies. Both steps are
/// idempotent. Returns whether such a source set exists.
fn link_source_set(
    project: &mut Project,
    family: &GeneratorFamily,
    source_set: &str,
    task: &str,
) -> Result<bool, ProjectError> {
    let Some(set) = project.source_set(source_set).cloned() else {
        tracing::debug!(task, "no source set named '{source_set}', task left unlinked");
        return Ok(false);
    };

    project
        .tasks_mut()
        .depends_on(&set.compile_task_name(), task)?;

    project
        .dependency_sets_mut()
        .maybe_create(&set.compile_dependencies_name())?
        .add_coordinate(family.runtime_coordinate())?;

    Ok(true)
}
