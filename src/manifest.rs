//! The `kata.toml` project manifest.

use std::collections::BTreeMap;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::base::BasePlugin;
use crate::dependency::MemoryCatalog;
use crate::error::ManifestError;
use crate::generator::{Generator, GeneratorPlugin, JavaLauncher, MavenLocal};
use crate::project::Project;

pub const DEFAULT_MANIFEST: &str = "kata.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub generation: Vec<GenerationSection>,
    /// Published modules. Without any, every module is assumed to exist and
    /// to have no dependencies.
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub build_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub source_sets: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    pub version: Option<String>,
    /// Root of the local Maven repository.
    pub repository: Option<Utf8PathBuf>,
    /// The `java` executable.
    pub java: Option<Utf8PathBuf>,
    /// Extra artifacts for the compiler classpath.
    #[serde(default)]
    pub classpath: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationSection {
    pub name: String,
    pub template_dir: Option<Utf8PathBuf>,
    pub output_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSection {
    pub id: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Settings which take precedence over the manifest, e.g. from the command
/// line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub generator_version: Option<String>,
}

impl Manifest {
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::Read(path.to_owned(), e))?;

        text.parse()
    }

    /// Builds the (not yet evaluated) project described by the manifest.
    /// Relative paths are resolved against `root`.
    pub fn into_project(
        self,
        root: impl Into<Utf8PathBuf>,
        overrides: &Overrides,
    ) -> Result<(Project, Generator), ManifestError> {
        let root = root.into();
        let anchor = |path: Utf8PathBuf| {
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        };

        let mut project = if self.modules.is_empty() {
            Project::new(root.clone())
        } else {
            let mut catalog = MemoryCatalog::new();
            for module in &self.modules {
                catalog.publish(&module.id, &module.dependencies)?;
            }
            Project::new(root.clone()).with_catalog(catalog)
        };

        if let Some(build_dir) = self.project.build_dir {
            project.set_build_dir(build_dir);
        }

        project.apply(BasePlugin)?;
        for name in &self.project.source_sets {
            project.add_source_set(name)?;
        }

        let section = self.generator;
        let mut plugin = GeneratorPlugin::rocker();

        if let Some(version) = overrides.generator_version.clone().or(section.version) {
            plugin = plugin.with_version(version);
        }
        if let Some(repository) = section.repository {
            plugin = plugin.with_locator(MavenLocal::new(anchor(repository)));
        }
        if let Some(java) = section.java {
            plugin = plugin.with_launcher(JavaLauncher::with_program(java));
        }

        let generator = project.apply(plugin)?;

        for notation in &section.classpath {
            generator.classpath().add(&mut project, notation)?;
        }

        for generation in self.generation {
            generator.configure(&mut project, &generation.name, |config| {
                if let Some(dir) = generation.template_dir {
                    config.set_template_dir(anchor(dir));
                }
                if let Some(dir) = generation.output_dir {
                    config.set_output_dir(anchor(dir));
                }
                for (key, value) in generation.options {
                    config.set_option(key, value);
                }
            })?;
        }

        Ok((project, generator))
    }
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;

    const FULL: &str = r#"
[project]
build_dir = "out"
source_sets = ["main", "test"]

[generator]
version = "0.17.0"
repository = "m2"
classpath = ["com.example:helper:1.0"]

[[generation]]
name = "main"
options = { optimize = "true", discardLogicWhitespace = "true" }

[[generation]]
name = "extra"
template_dir = "templates"
output_dir = "/tmp/extra"

[[module]]
id = "com.fizzed:rocker-compiler:0.17.0"
dependencies = ["com.fizzed:rocker-runtime:0.17.0"]

[[module]]
id = "com.fizzed:rocker-runtime:0.17.0"

[[module]]
id = "org.slf4j:slf4j-simple:1.7.23"

[[module]]
id = "com.example:helper:1.0"
"#;

    #[test]
    fn test_empty_manifest() {
        let manifest: Manifest = "".parse().unwrap();
        assert!(manifest.generation.is_empty());
        assert!(manifest.modules.is_empty());

        let (mut project, generator) = manifest
            .into_project("/work", &Overrides::default())
            .unwrap();
        project.evaluate().unwrap();

        assert_eq!(generator.pin().get(), "0.16.0");
        assert!(project.dependency_sets().find("rockerCompiler").is_some());
    }

    #[test]
    fn test_full_manifest() {
        let manifest: Manifest = FULL.parse().unwrap();
        let (mut project, generator) = manifest
            .into_project("/work", &Overrides::default())
            .unwrap();
        project.evaluate().unwrap();

        assert_eq!(project.build_dir(), "/work/out");
        assert_eq!(generator.pin().get(), "0.17.0");

        let configs = generator.configs(&project).unwrap();
        let main = configs.find("main").unwrap();
        assert_eq!(main.template_dir(), "/work/src/main/rocker");
        assert_eq!(main.output_dir(), "/work/out/generated-src/rocker/main");
        assert_eq!(main.options().len(), 2);

        let extra = configs.find("extra").unwrap();
        assert_eq!(extra.template_dir(), "/work/templates");
        assert_eq!(extra.output_dir(), "/tmp/extra");

        assert_eq!(project.tasks().dependencies_of("compileMain"), vec!["rockerMain"]);

        let classpath = project.resolve("rockerCompiler").unwrap();
        assert_eq!(classpath.len(), 4);
        assert_eq!(classpath.version_of("com.fizzed", "rocker-runtime"), Some("0.17.0"));
    }

    #[test]
    fn test_override_wins() {
        let manifest: Manifest = FULL.parse().unwrap();
        let overrides = Overrides {
            generator_version: Some("0.18.0".into()),
        };

        let (_, generator) = manifest.into_project("/work", &overrides).unwrap();
        assert_eq!(generator.pin().get(), "0.18.0");
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = "[project]\nbuild = \"x\"\n".parse::<Manifest>().unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn test_malformed_module() {
        let manifest: Manifest = "[[module]]\nid = \"just-a-name\"\n".parse().unwrap();
        assert!(matches!(
            manifest.into_project("/work", &Overrides::default()),
            Err(ManifestError::Coordinate(_))
        ));
    }

    #[test]
    fn test_duplicate_source_set() {
        let manifest: Manifest = "[project]\nsource_sets = [\"main\", \"main\"]\n".parse().unwrap();
        assert!(matches!(
            manifest.into_project("/work", &Overrides::default()),
            Err(ManifestError::Project(ProjectError::Container(_)))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join(DEFAULT_MANIFEST);

        assert!(matches!(Manifest::load(&path), Err(ManifestError::Read(..))));

        std::fs::write(&path, "[generator]\nversion = \"1.0\"\n").unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.generator.version.as_deref(), Some("1.0"));
    }
}
