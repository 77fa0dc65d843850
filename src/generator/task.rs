use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::core::{Fingerprint, Hash32};
use crate::error::GenerateError;
use crate::generator::launcher::{ArtifactLocator, Invocation, Launcher};
use crate::generator::{GenerationConfig, GeneratorFamily, RuntimeClasspath};
use crate::project::{Action, Outcome, TaskContext};

/// The action of a generation task: compiles the templates of one
/// configuration into sources with the shared runtime classpath.
///
/// The task is skipped when the template directory holds no files, and
/// reported up to date when nothing that influences the output changed since
/// the last successful run.
pub struct GenerationTask {
    pub(crate) family: GeneratorFamily,
    pub(crate) config: Arc<GenerationConfig>,
    pub(crate) classpath: RuntimeClasspath,
    pub(crate) launcher: Arc<dyn Launcher>,
    pub(crate) locator: Arc<dyn ArtifactLocator>,
}

impl GenerationTask {
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn classpath(&self) -> RuntimeClasspath {
        self.classpath
    }

    pub fn generate(&self, ctx: &TaskContext<'_>) -> Result<Outcome, GenerateError> {
        let config = &self.config;

        let templates = collect_files(config.template_dir())?;
        if templates.is_empty() {
            tracing::info!(
                parent: ctx.span(),
                task = ctx.name,
                "no templates in {}",
                config.template_dir()
            );
            return Ok(Outcome::NoSource);
        }

        let resolution = self.classpath.resolve(ctx.project)?;

        let mut fingerprint = Fingerprint::new();
        fingerprint
            .field("main", self.family.main_class)
            .path("templates", config.template_dir())
            .path("output", config.output_dir());

        let mut jars = Vec::with_capacity(resolution.len());
        for resolved in resolution.modules() {
            let jar = self
                .locator
                .locate(&resolved.module)
                .ok_or_else(|| GenerateError::ArtifactNotFound(resolved.module.to_string()))?;

            fingerprint.field("module", resolved.module.to_string());
            jars.push(jar);
        }

        for (key, value) in config.options() {
            fingerprint.field("option", key).field("value", value);
        }

        for template in &templates {
            let hash = Hash32::hash_file(template)
                .map_err(|e| GenerateError::Io(template.clone(), e))?;
            fingerprint
                .path("template", template)
                .field("content", hash.to_hex());
        }

        let hash = fingerprint.finish().to_hex();
        let stamp = ctx
            .project
            .build_dir()
            .join("tmp")
            .join(ctx.name)
            .join("inputs.blake3");

        if is_up_to_date(&stamp, &hash, config.output_dir())? {
            tracing::debug!(task = ctx.name, "inputs unchanged");
            return Ok(Outcome::UpToDate);
        }

        // A failed run must not leave the previous stamp next to a cleared
        // output directory.
        remove_stamp(&stamp)?;
        clear_dir(config.output_dir())?;

        let invocation = self.invocation(ctx.project.root(), jars);
        tracing::info!(
            parent: ctx.span(),
            task = ctx.name,
            templates = templates.len(),
            "generating into {}",
            config.output_dir()
        );
        self.launcher.launch(&invocation)?;

        if let Some(parent) = stamp.parent() {
            fs::create_dir_all(parent).map_err(|e| GenerateError::Io(parent.to_owned(), e))?;
        }
        let outputs = hash_outputs(config.output_dir())?;
        fs::write(&stamp, format!("{hash}\n{outputs}"))
            .map_err(|e| GenerateError::Io(stamp.clone(), e))?;

        Ok(Outcome::Executed)
    }

    fn invocation(&self, working_dir: &Utf8Path, classpath: Vec<Utf8PathBuf>) -> Invocation {
        let family = &self.family;
        let config = &self.config;

        let mut properties = vec![
            (
                family.template_dir_property(),
                config.template_dir().to_string(),
            ),
            (
                family.output_dir_property(),
                config.output_dir().to_string(),
            ),
        ];

        for (key, value) in config.options() {
            properties.push((family.option_property(key), value.clone()));
        }

        Invocation {
            main_class: family.main_class.to_string(),
            classpath,
            properties,
            working_dir: working_dir.to_owned(),
        }
    }
}

impl Action for GenerationTask {
    fn execute(&self, ctx: &TaskContext<'_>) -> anyhow::Result<Outcome> {
        Ok(self.generate(ctx)?)
    }
}

/// The stamp holds the input fingerprint and the fingerprint of the files
/// the run produced, one per line.
fn is_up_to_date(
    stamp: &Utf8Path,
    inputs: &str,
    output_dir: &Utf8Path,
) -> Result<bool, GenerateError> {
    let Ok(old) = fs::read_to_string(stamp) else {
        return Ok(false);
    };
    let Some((old_inputs, old_outputs)) = old.split_once('\n') else {
        return Ok(false);
    };

    if old_inputs != inputs || !output_dir.is_dir() {
        return Ok(false);
    }

    Ok(hash_outputs(output_dir)? == old_outputs)
}

fn hash_outputs(dir: &Utf8Path) -> Result<String, GenerateError> {
    let mut fingerprint = Fingerprint::new();
    for file in collect_files(dir)? {
        let hash = Hash32::hash_file(&file).map_err(|e| GenerateError::Io(file.clone(), e))?;
        let relative = file.strip_prefix(dir).unwrap_or(file.as_path());
        fingerprint.path("output", relative).field("content", hash.to_hex());
    }
    Ok(fingerprint.finish().to_hex())
}

/// Every file below `dir`, sorted. A missing directory has no files.
fn collect_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, GenerateError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}/**/*", glob::Pattern::escape(dir.as_str()));

    let mut templates = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = Utf8PathBuf::try_from(entry?)?;
        if path.is_file() {
            templates.push(path);
        }
    }

    templates.sort();
    Ok(templates)
}

fn remove_stamp(stamp: &Utf8Path) -> Result<(), GenerateError> {
    match fs::remove_file(stamp) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(GenerateError::Io(stamp.to_owned(), e))
        }
        _ => Ok(()),
    }
}

fn clear_dir(dir: &Utf8Path) -> Result<(), GenerateError> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| GenerateError::Io(dir.to_owned(), e))?;
    }

    fs::create_dir_all(dir).map_err(|e| GenerateError::Io(dir.to_owned(), e))
}
