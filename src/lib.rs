#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod base;
mod container;
mod core;
pub mod dependency;
mod error;
mod executor;
pub mod generator;
pub mod manifest;
mod project;
pub mod utils;

pub use crate::base::BasePlugin;
pub use crate::container::NamedContainer;
pub use crate::dependency::{
    Catalog, Coordinate, DependencySet, DependencySets, DirectCatalog, MemoryCatalog, ModuleId,
    ModuleVersion, Resolution, ResolutionRule, ResolveDetails,
};
pub use crate::error::*;
pub use crate::executor::{Diagnostics, TaskExecution};
pub use crate::generator::{
    GenerationConfig, GenerationTask, Generator, GeneratorFamily, GeneratorPlugin,
    RuntimeClasspath, VersionEnforcer, VersionPin,
};
pub use crate::project::{
    Action, Outcome, Plugin, Project, SourceSet, Task, TaskContext, TaskDef, TaskGraph, TaskHandle,
};
