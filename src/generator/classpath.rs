use crate::Project;
use crate::dependency::Resolution;
use crate::error::{DependencyError, ProjectError, ResolveError};
use crate::generator::GeneratorFamily;

/// Handle to the dependency set used to invoke the template compiler.
///
/// There is one per project, shared read-only by every generation task. It
/// stays open for additions until the first generation task resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeClasspath {
    name: &'static str,
}

impl RuntimeClasspath {
    /// Creates the classpath dependency set and seeds it with the compiler
    /// and a logging backend.
    pub(crate) fn provision(
        project: &mut Project,
        family: &GeneratorFamily,
    ) -> Result<Self, ProjectError> {
        let set = project.dependency_sets_mut().create(family.classpath)?;
        set.set_description(family.classpath_description);
        set.add_coordinate(family.engine_coordinate())?;
        set.add(family.logging_backend)?;

        tracing::debug!(set = family.classpath, "provisioned generator classpath");

        Ok(Self {
            name: family.classpath,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Adds an artifact to the classpath, e.g. a plugin of the template
    /// compiler.
    pub fn add(&self, project: &mut Project, notation: &str) -> Result<bool, DependencyError> {
        project.dependency_sets_mut().add(self.name, notation)
    }

    pub fn resolve<'a>(&self, project: &'a Project) -> Result<&'a Resolution, ResolveError> {
        project.resolve(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Coordinate;

    #[test]
    fn test_seeded_with_two_artifacts() {
        let family = GeneratorFamily::rocker();
        let mut project = Project::new("/work");
        let classpath = RuntimeClasspath::provision(&mut project, &family).unwrap();

        let set = project.dependency_sets().find("rockerCompiler").unwrap();
        assert_eq!(classpath.name(), "rockerCompiler");
        assert_eq!(
            set.description(),
            Some("The classpath used to invoke the Rocker template engine. Add your additional dependencies here.")
        );

        let expected: Vec<Coordinate> = vec![
            "com.fizzed:rocker-compiler".parse().unwrap(),
            "org.slf4j:slf4j-simple:1.7.23".parse().unwrap(),
        ];
        assert_eq!(set.dependencies(), expected.as_slice());
    }

    #[test]
    fn test_open_until_resolved() {
        let family = GeneratorFamily::rocker();
        let mut project = Project::new("/work");
        let classpath = RuntimeClasspath::provision(&mut project, &family).unwrap();

        assert!(classpath.add(&mut project, "com.example:helper:1.0").unwrap());

        // nothing pins the compiler here
        assert!(matches!(
            classpath.resolve(&project),
            Err(ResolveError::MissingVersion { .. })
        ));
        assert!(matches!(
            classpath.add(&mut project, "com.example:late:1.0"),
            Err(DependencyError::AlreadyResolved(_))
        ));
    }
}
