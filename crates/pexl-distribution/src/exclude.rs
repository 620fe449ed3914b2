use pexl_requirement::{Requirement, RequirementParseError};

use crate::Distribution;

/// Requirements naming projects to leave out of a resolve or install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeConfiguration {
    excluded: Vec<Requirement>,
}

impl ExcludeConfiguration {
    pub fn create<'a>(
        requirements: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, RequirementParseError> {
        Ok(Self {
            excluded: requirements
                .into_iter()
                .map(Requirement::parse)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.excluded.iter()
    }

    /// The exclusions that admit `distribution`.
    pub fn excluded_by(&self, distribution: &Distribution) -> Vec<&Requirement> {
        self.excluded
            .iter()
            .filter(|requirement| requirement.matches(distribution))
            .collect()
    }

    /// The exclusions on the same project as `requirement`.
    pub fn excluded_by_requirement(&self, requirement: &Requirement) -> Vec<&Requirement> {
        self.excluded
            .iter()
            .filter(|excluded| excluded.project_name() == requirement.project_name())
            .collect()
    }
}

impl FromIterator<Requirement> for ExcludeConfiguration {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        Self {
            excluded: iter.into_iter().collect(),
        }
    }
}
