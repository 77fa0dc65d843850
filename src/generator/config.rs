use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::container::NamedContainer;
use crate::generator::GeneratorFamily;

/// Container of generation configurations, registered as a project extension
/// under the family name.
pub type GenerationConfigs = NamedContainer<GenerationConfig>;

/// One generation step: where the templates live, where the generated
/// sources go and which options the template compiler receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    name: String,
    template_dir: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    options: BTreeMap<String, String>,
}

impl GenerationConfig {
    /// A configuration with conventional directories:
    /// `<root>/src/<name>/<family>` for templates and
    /// `<build>/generated-src/<family>/<name>` for output.
    pub fn new(name: &str, family: &GeneratorFamily, root: &Utf8Path, build_dir: &Utf8Path) -> Self {
        Self {
            name: name.to_string(),
            template_dir: root.join("src").join(name).join(family.name),
            output_dir: build_dir.join("generated-src").join(family.name).join(name),
            options: BTreeMap::new(),
        }
    }

    pub(crate) fn container(
        family: GeneratorFamily,
        root: Utf8PathBuf,
        build_dir: Utf8PathBuf,
    ) -> GenerationConfigs {
        NamedContainer::new("Generation config", move |name| {
            GenerationConfig::new(name, &family, &root, &build_dir)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template_dir(&self) -> &Utf8Path {
        &self.template_dir
    }

    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Options passed verbatim to the template compiler, ordered by key.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn set_template_dir(&mut self, dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.template_dir = dir.into();
        self
    }

    pub fn set_output_dir(&mut self, dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.output_dir = dir.into();
        self
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Makes relative directories absolute against `root`.
    pub(crate) fn anchored(mut self, root: &Utf8Path) -> Self {
        for dir in [&mut self.template_dir, &mut self.output_dir] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        self
    }
}
