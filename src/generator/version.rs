use std::sync::{Arc, PoisonError, RwLock};

use crate::dependency::{ResolutionRule, ResolveDetails};
use crate::generator::GeneratorFamily;

/// The version every module of a generator family is forced to.
///
/// Clones share the same value. The pin is read each time a dependency set
/// resolves, so changing it only affects sets which have not been resolved
/// yet.
#[derive(Debug, Clone)]
pub struct VersionPin(Arc<RwLock<String>>);

impl VersionPin {
    pub fn new(version: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(version.into())))
    }

    pub fn get(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, version: impl Into<String>) {
        let version = version.into();
        tracing::debug!(%version, "generator version pinned");
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = version;
    }
}

/// Rewrites the version of every request for a module of the family to the
/// pinned one. Requests for any other module pass through untouched.
#[derive(Debug, Clone)]
pub struct VersionEnforcer {
    family: GeneratorFamily,
    pin: VersionPin,
}

impl VersionEnforcer {
    pub fn new(family: GeneratorFamily, pin: VersionPin) -> Self {
        Self { family, pin }
    }

    pub fn matches(&self, group: &str, name: &str) -> bool {
        self.family.matches(group, name)
    }
}

impl ResolutionRule for VersionEnforcer {
    fn apply(&self, details: &mut ResolveDetails) {
        let requested = details.requested();
        if self.matches(requested.group(), requested.name()) {
            details.use_version(self.pin.get());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{DependencySet, MemoryCatalog};

    fn enforcer(version: &str) -> (VersionPin, Arc<VersionEnforcer>) {
        let pin = VersionPin::new(version);
        let rule = VersionEnforcer::new(GeneratorFamily::rocker(), pin.clone());
        (pin, Arc::new(rule))
    }

    fn details(notation: &str) -> ResolveDetails {
        ResolveDetails::new(notation.parse().unwrap())
    }

    #[test]
    fn test_pins_family_members() {
        let (_, rule) = enforcer("0.16.0");

        let mut engine = details("com.fizzed:rocker-compiler:0.10.0");
        rule.apply(&mut engine);
        assert_eq!(engine.target_version(), Some("0.16.0"));

        let mut versionless = details("com.fizzed:rocker-runtime");
        rule.apply(&mut versionless);
        assert_eq!(versionless.target_version(), Some("0.16.0"));
    }

    #[test]
    fn test_leaves_others_alone() {
        let (_, rule) = enforcer("0.16.0");

        for notation in [
            "org.slf4j:slf4j-simple:1.7.23",
            "com.fizzed:other:1.0",
            "org.fizzed:rocker-compiler:1.0",
        ] {
            let mut other = details(notation);
            rule.apply(&mut other);
            assert_eq!(other.target_version(), other.requested().version.as_deref());
        }
    }

    #[test]
    fn test_pin_before_and_after_resolution() {
        let (pin, rule) = enforcer("0.16.0");
        let catalog = crate::dependency::DirectCatalog;

        let mut early = DependencySet::new("early");
        early.add("com.fizzed:rocker-compiler").unwrap();
        early.each_dependency(rule.clone());

        let mut late = DependencySet::new("late");
        late.add("com.fizzed:rocker-compiler").unwrap();
        late.each_dependency(rule);

        let resolved = early.resolve(&catalog).unwrap();
        assert_eq!(resolved.version_of("com.fizzed", "rocker-compiler"), Some("0.16.0"));

        pin.set("0.17.0");

        let resolved = early.resolve(&catalog).unwrap();
        assert_eq!(resolved.version_of("com.fizzed", "rocker-compiler"), Some("0.16.0"));

        let resolved = late.resolve(&catalog).unwrap();
        assert_eq!(resolved.version_of("com.fizzed", "rocker-compiler"), Some("0.17.0"));
    }

    #[test]
    fn test_pins_transitive_requests() {
        let (_, rule) = enforcer("0.18.0");

        let mut catalog = MemoryCatalog::new();
        catalog
            .publish("com.fizzed:rocker-compiler:0.18.0", ["com.fizzed:rocker-runtime:0.9.0"])
            .unwrap()
            .publish("com.fizzed:rocker-runtime:0.18.0", ["org.slf4j:slf4j-api:1.7.23"])
            .unwrap()
            .publish("org.slf4j:slf4j-api:1.7.23", Vec::<&str>::new())
            .unwrap();

        let mut set = DependencySet::new("rockerCompiler");
        set.add("com.fizzed:rocker-compiler").unwrap();
        set.each_dependency(rule);

        let resolved = set.resolve(&catalog).unwrap();
        assert_eq!(resolved.version_of("com.fizzed", "rocker-runtime"), Some("0.18.0"));
        assert_eq!(resolved.version_of("org.slf4j", "slf4j-api"), Some("1.7.23"));
        assert!(resolved.modules().iter().all(|m| m.module.id.group != "com.fizzed" || m.forced));
    }
}
