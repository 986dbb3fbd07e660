//! Static content catalogs
//!
//! Experiments, observation templates and reference species are immutable
//! content shipped with the app as YAML. A directory with the same three
//! files can replace the built-in catalog through configuration.

pub mod experiments;
pub mod templates;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub use experiments::{ExperimentDefinition, ExperimentVariant};
pub use templates::{ObservationTemplate, ReferenceSpecies};

use crate::types::TaskCategory;

const BUILTIN_EXPERIMENTS: &str = include_str!("../../data/experiments.yaml");
const BUILTIN_TEMPLATES: &str = include_str!("../../data/templates.yaml");
const BUILTIN_SPECIES: &str = include_str!("../../data/species.yaml");

/// Read-only content the engines work from
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    experiments: Vec<ExperimentDefinition>,
    templates: Vec<ObservationTemplate>,
    species: Vec<ReferenceSpecies>,
}

impl Catalog {
    /// Build a catalog, ordering experiments by week
    pub fn new(
        mut experiments: Vec<ExperimentDefinition>,
        templates: Vec<ObservationTemplate>,
        species: Vec<ReferenceSpecies>,
    ) -> Self {
        experiments.sort_by_key(|e| e.week);

        let mut seen = HashSet::new();
        for experiment in &experiments {
            if !seen.insert(experiment.id.as_str()) {
                warn!("Duplicate experiment id in catalog: {}", experiment.id);
            }
        }

        Self { experiments, templates, species }
    }

    /// The catalog bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_EXPERIMENTS, BUILTIN_TEMPLATES, BUILTIN_SPECIES)
            .context("Failed to parse built-in catalog")
    }

    /// Load experiments.yaml, templates.yaml and species.yaml from a directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))
        };
        let catalog = Self::from_yaml(
            &read("experiments.yaml")?,
            &read("templates.yaml")?,
            &read("species.yaml")?,
        )?;
        info!(
            "Loaded catalog from {}: {} experiments, {} templates, {} species",
            dir.display(),
            catalog.experiments.len(),
            catalog.templates.len(),
            catalog.species.len()
        );
        Ok(catalog)
    }

    /// Load the catalog selected by configuration
    pub fn load(config: &crate::config::Config) -> Result<Self> {
        match &config.catalog.dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::builtin(),
        }
    }

    fn from_yaml(experiments: &str, templates: &str, species: &str) -> Result<Self> {
        let experiments: Vec<ExperimentDefinition> = serde_yaml::from_str(experiments)
            .context("Failed to parse experiments")?;
        let templates: Vec<ObservationTemplate> = serde_yaml::from_str(templates)
            .context("Failed to parse observation templates")?;
        let species: Vec<ReferenceSpecies> = serde_yaml::from_str(species)
            .context("Failed to parse reference species")?;
        Ok(Self::new(experiments, templates, species))
    }

    /// Experiments in curriculum order
    pub fn experiments(&self) -> &[ExperimentDefinition] {
        &self.experiments
    }

    pub fn templates(&self) -> &[ObservationTemplate] {
        &self.templates
    }

    pub fn species(&self) -> &[ReferenceSpecies] {
        &self.species
    }

    pub fn find_experiment(&self, id: &str) -> Option<&ExperimentDefinition> {
        self.experiments.iter().find(|e| e.id == id)
    }

    /// Reference species of one category
    pub fn species_in(&self, category: TaskCategory) -> Vec<&ReferenceSpecies> {
        self.species.iter().filter(|s| s.category == category).collect()
    }
}
