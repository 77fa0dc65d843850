use crate::core::capitalize;

/// A compile unit: a named group of sources with its own compile task and
/// compile dependency set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    name: String,
}

impl SourceSet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `compileMain`, `compileTest`, ...
    pub fn compile_task_name(&self) -> String {
        format!("compile{}", capitalize(&self.name))
    }

    /// `compile` for the main source set, `<name>Compile` for the others.
    pub fn compile_dependencies_name(&self) -> String {
        if self.is_main() {
            "compile".to_string()
        } else {
            format!("{}Compile", self.name)
        }
    }

    pub fn is_main(&self) -> bool {
        self.name == "main"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_names() {
        let main = SourceSet::new("main");
        assert_eq!(main.compile_task_name(), "compileMain");
        assert_eq!(main.compile_dependencies_name(), "compile");

        let it = SourceSet::new("integrationTest");
        assert_eq!(it.compile_task_name(), "compileIntegrationTest");
        assert_eq!(it.compile_dependencies_name(), "integrationTestCompile");
    }
}
