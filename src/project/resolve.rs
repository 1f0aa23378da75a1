//! Materialize configured steps into executable [`Step`] records.

use tracing::warn;

use super::types::{SectionConfig, WalletConfig};
use crate::workflow::{Step, Target};

impl WalletConfig {
    /// Resolved steps of one section, in declaration order.
    ///
    /// Unknown sections yield an empty list.
    pub fn section_steps(&self, section_name: &str) -> Vec<Step> {
        match self.documentation.sections.get(section_name) {
            Some(section) => resolve_section(section_name, section),
            None => {
                warn!(section = section_name, "section not declared in configuration");
                Vec::new()
            }
        }
    }

    /// Resolved steps of every section, sections in declaration order
    pub fn all_steps(&self) -> Vec<Step> {
        self.documentation
            .sections
            .iter()
            .flat_map(|(name, section)| resolve_section(name, section))
            .collect()
    }
}

fn resolve_section(section_name: &str, section: &SectionConfig) -> Vec<Step> {
    section
        .steps
        .iter()
        .map(|declared| {
            let mut step = declared.clone();

            // A selector naming a section coordinate becomes that coordinate
            let named = match &step.target {
                Some(Target::Selector(name)) => section.coordinates.get(name).copied(),
                _ => None,
            };
            if let Some(point) = named {
                step.target = Some(Target::Coordinates(point));
            }

            if step.crop_region.is_none() {
                step.crop_region = section.crop;
            }

            step.section = Some(section_name.to_string());
            step
        })
        .collect()
}
