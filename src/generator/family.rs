use crate::core::capitalize;
use crate::dependency::Coordinate;

/// Every constant describing one template generator and the dependency
/// family it is distributed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorFamily {
    /// Short lowercase name. Used as plugin id, extension name, task name
    /// prefix, directory segment and system property prefix.
    pub name: &'static str,
    /// Human readable name, also the group of generation tasks.
    pub display_name: &'static str,
    /// Maven group shared by the whole family.
    pub group: &'static str,
    /// Every module whose name starts with this prefix is pinned.
    pub module_prefix: &'static str,
    /// Module containing the template compiler.
    pub engine: &'static str,
    /// Module the generated sources need at compile time.
    pub runtime: &'static str,
    /// Logging backend put on the compiler classpath, with its version.
    pub logging_backend: &'static str,
    pub default_version: &'static str,
    /// Name of the dependency set holding the compiler classpath.
    pub classpath: &'static str,
    pub classpath_description: &'static str,
    pub task_description: &'static str,
    /// Entry point of the template compiler.
    pub main_class: &'static str,
}

impl GeneratorFamily {
    pub const fn rocker() -> Self {
        Self {
            name: "rocker",
            display_name: "Rocker",
            group: "com.fizzed",
            module_prefix: "rocker-",
            engine: "rocker-compiler",
            runtime: "rocker-runtime",
            logging_backend: "org.slf4j:slf4j-simple:1.7.23",
            default_version: "0.16.0",
            classpath: "rockerCompiler",
            classpath_description: "The classpath used to invoke the Rocker template engine. Add your additional dependencies here.",
            task_description: "Invokes the Rocker template engine.",
            main_class: "com.fizzed.rocker.compiler.JavaGeneratorMain",
        }
    }

    /// Whether a requested module belongs to the pinned family.
    pub fn matches(&self, group: &str, name: &str) -> bool {
        group == self.group && name.starts_with(self.module_prefix)
    }

    /// `rocker` + `Main` = `rockerMain`.
    pub fn task_name(&self, config: &str) -> String {
        format!("{}{}", self.name, capitalize(config))
    }

    /// The template compiler, versionless so that the pin decides.
    pub fn engine_coordinate(&self) -> Coordinate {
        Coordinate::new(self.group, self.engine)
    }

    /// The runtime support library, versionless so that the pin decides.
    pub fn runtime_coordinate(&self) -> Coordinate {
        Coordinate::new(self.group, self.runtime)
    }

    pub fn template_dir_property(&self) -> String {
        format!("{}.template.dir", self.name)
    }

    pub fn output_dir_property(&self) -> String {
        format!("{}.output.dir", self.name)
    }

    pub fn option_property(&self, key: &str) -> String {
        format!("{}.option.{key}", self.name)
    }
}

impl Default for GeneratorFamily {
    fn default() -> Self {
        Self::rocker()
    }
}
