use std::ffi::OsString;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::dependency::ModuleVersion;
use crate::error::GenerateError;

/// A single run of the template compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub main_class: String,
    pub classpath: Vec<Utf8PathBuf>,
    /// System properties, in the order they are passed.
    pub properties: Vec<(String, String)>,
    pub working_dir: Utf8PathBuf,
}

impl Invocation {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// JVM arguments: `-cp <classpath> -D<key>=<value>... <main class>`.
    pub fn arguments(&self) -> Result<Vec<OsString>, std::env::JoinPathsError> {
        let mut args = Vec::with_capacity(self.properties.len() + 3);
        args.push(OsString::from("-cp"));
        args.push(std::env::join_paths(&self.classpath)?);

        for (key, value) in &self.properties {
            args.push(format!("-D{key}={value}").into());
        }

        args.push(OsString::from(&self.main_class));
        Ok(args)
    }
}

/// Runs the template compiler.
pub trait Launcher: Send + Sync {
    fn launch(&self, invocation: &Invocation) -> Result<(), GenerateError>;
}

impl<L: Launcher + ?Sized> Launcher for std::sync::Arc<L> {
    fn launch(&self, invocation: &Invocation) -> Result<(), GenerateError> {
        (**self).launch(invocation)
    }
}

/// Launches the compiler in a child JVM.
///
/// The `java` executable is taken from the explicit program if one was set,
/// then from `$JAVA_HOME/bin/java`, and finally looked up on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct JavaLauncher {
    program: Option<Utf8PathBuf>,
}

impl JavaLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    pub fn program(&self) -> Utf8PathBuf {
        if let Some(program) = &self.program {
            return program.clone();
        }

        match std::env::var("JAVA_HOME") {
            Ok(home) if !home.is_empty() => Utf8Path::new(&home).join("bin").join("java"),
            _ => Utf8PathBuf::from("java"),
        }
    }
}

impl Launcher for JavaLauncher {
    fn launch(&self, invocation: &Invocation) -> Result<(), GenerateError> {
        let program = self.program();

        let args = invocation
            .arguments()
            .map_err(|e| GenerateError::Launch {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            })?;

        tracing::debug!(%program, main = %invocation.main_class, "launching generator");

        let output = Command::new(&program)
            .args(&args)
            .current_dir(&invocation.working_dir)
            .output()
            .map_err(|source| GenerateError::Launch {
                program: program.to_string(),
                source,
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!("{line}");
        }

        if !output.status.success() {
            return Err(GenerateError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

/// Finds the jar file of a resolved module.
pub trait ArtifactLocator: Send + Sync {
    fn locate(&self, module: &ModuleVersion) -> Option<Utf8PathBuf>;
}

impl<F> ArtifactLocator for F
where
    F: Fn(&ModuleVersion) -> Option<Utf8PathBuf> + Send + Sync,
{
    fn locate(&self, module: &ModuleVersion) -> Option<Utf8PathBuf> {
        self(module)
    }
}

/// A local Maven repository,
/// `<root>/<group as path>/<name>/<version>/<name>-<version>.jar`.
#[derive(Debug, Clone)]
pub struct MavenLocal {
    root: Utf8PathBuf,
}

impl MavenLocal {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.m2/repository`, or a relative `.m2/repository` when the home
    /// directory is unknown.
    pub fn default_root() -> Utf8PathBuf {
        dirs::home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .unwrap_or_default()
            .join(".m2")
            .join("repository")
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn artifact_path(&self, module: &ModuleVersion) -> Utf8PathBuf {
        let mut path = self.root.clone();
        for segment in module.id.group.split('.') {
            path.push(segment);
        }

        path.join(&module.id.name)
            .join(&module.version)
            .join(format!("{}-{}.jar", module.id.name, module.version))
    }
}

impl Default for MavenLocal {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

impl ArtifactLocator for MavenLocal {
    fn locate(&self, module: &ModuleVersion) -> Option<Utf8PathBuf> {
        let path = self.artifact_path(module);
        path.is_file().then_some(path)
    }
}
