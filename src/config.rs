use serde::{Deserialize, Serialize};

use crate::{errors::SGError, generators::{Generator, HashGenerator}, storage::{BoundingBox, SparseGridData}};

///
/// Grid scheme together with its parameters, one variant per generator entry point.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridScheme
{
    Regular { level: usize, #[serde(default)] t: Option<f64> },
    RegularInter { level: usize, terms: Vec<Vec<usize>>, #[serde(default)] t: Option<f64> },
    Cliques { level: usize, clique_size: usize, #[serde(default)] t: Option<f64> },
    Full { level: usize },
    AnisotropicFull { levels: Vec<usize> },
    FullWithBoundaries { level: usize },
    RegularWithBoundaries { level: usize, #[serde(default)] boundary_level: Option<usize> },
    RegularWithPeriodicBoundaries { level: usize, #[serde(default)] t: Option<f64> },
    SquareRoot { level: usize },
    Truncated { level: usize, k: usize },
}

///
/// Serializable description of a grid: dimension, scheme and (optionally)
/// the bounding box of the domain.
///
/// ```json
/// { "num_inputs": 2, "scheme": { "type": "regular_with_boundaries", "level": 3, "boundary_level": 1 } }
/// ```
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig
{
    pub num_inputs: usize,
    pub scheme: GridScheme,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl GridConfig
{
    pub fn new(num_inputs: usize, scheme: GridScheme) -> Self
    {
        Self { num_inputs, scheme, bounding_box: None }
    }

    pub fn from_json(json: &str) -> Result<Self, SGError>
    {
        serde_json::from_str(json).map_err(|err|
        {
            log::error!("Failed to parse grid configuration: {err}");
            SGError::DeserializationFailed
        })
    }

    pub fn to_json(&self) -> Result<String, SGError>
    {
        serde_json::to_string_pretty(self).map_err(|_| SGError::SerializationFailed)
    }

    ///
    /// Runs the configured scheme on `storage` through `generator`. The
    /// storage dimension has to match `num_inputs`.
    ///
    pub fn generate<G: Generator>(&self, generator: &G, storage: &mut SparseGridData) -> Result<(), SGError>
    {
        if storage.num_inputs() != self.num_inputs
        {
            return Err(SGError::InvalidDimension);
        }
        match &self.scheme
        {
            GridScheme::Regular { level, t } => generator.regular(storage, *level, *t),
            GridScheme::RegularInter { level, terms, t } => generator.regular_inter(storage, *level, terms, *t),
            GridScheme::Cliques { level, clique_size, t } => generator.cliques(storage, *level, *clique_size, *t),
            GridScheme::Full { level } => generator.full(storage, *level),
            GridScheme::AnisotropicFull { levels } => generator.anisotropic_full(storage, levels),
            GridScheme::FullWithBoundaries { level } => generator.full_with_boundaries(storage, *level),
            GridScheme::RegularWithBoundaries { level, boundary_level } => generator.regular_with_boundaries(storage, *level, *boundary_level),
            GridScheme::RegularWithPeriodicBoundaries { level, t } => generator.regular_with_periodic_boundaries(storage, *level, *t),
            GridScheme::SquareRoot { level } => generator.square_root(storage, *level),
            GridScheme::Truncated { level, k } => generator.truncated(storage, *level, *k),
        }
    }

    ///
    /// Allocates a new storage and generates the configured grid into it.
    ///
    pub fn build(&self) -> Result<SparseGridData, SGError>
    {
        if self.num_inputs == 0
        {
            return Err(SGError::InvalidDimension);
        }
        let mut storage = SparseGridData::new(self.num_inputs);
        if let Some(bounding_box) = &self.bounding_box
        {
            if bounding_box.lower.len() != self.num_inputs || bounding_box.upper.len() != self.num_inputs
            {
                return Err(SGError::InvalidDimension);
            }
            storage.bounding_box = bounding_box.clone();
        }
        self.generate(&HashGenerator, &mut storage)?;
        Ok(storage)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::generators::{regular_inter, regular_with_boundaries};

    #[test]
    fn test_build_from_json()
    {
        let config = GridConfig::from_json(r#"{ "num_inputs": 2, "scheme": { "type": "regular_with_boundaries", "level": 3 } }"#).unwrap();
        assert_eq!(config.scheme, GridScheme::RegularWithBoundaries { level: 3, boundary_level: None });
        let storage = config.build().unwrap();
        let mut reference = SparseGridData::new(2);
        regular_with_boundaries(&mut reference, 3, Some(1)).unwrap();
        assert_eq!(storage.len(), reference.len());
        assert!(reference.nodes().all(|p| storage.contains(&p)));
    }

    #[test]
    fn test_json_roundtrip()
    {
        let mut config = GridConfig::new(3, GridScheme::RegularInter { level: 4, terms: vec![vec![], vec![0], vec![1, 2]], t: Some(0.5) });
        config.bounding_box = Some(BoundingBox::new(&[-1.0, 0.0, 0.0], &[1.0, 2.0, 1.0]));
        let json = config.to_json().unwrap();
        assert_eq!(GridConfig::from_json(&json).unwrap(), config);

        let storage = config.build().unwrap();
        let mut reference = SparseGridData::new(3);
        regular_inter(&mut reference, 4, &[vec![], vec![0], vec![1, 2]], Some(0.5)).unwrap();
        assert_eq!(storage.len(), reference.len());
        assert_eq!(storage.bounding_box(), config.bounding_box.as_ref().unwrap());
        for point in storage.points()
        {
            assert!(storage.bounding_box().contains(&point));
        }
    }

    #[test]
    fn test_invalid_config()
    {
        assert_eq!(GridConfig::from_json(r#"{ "num_inputs": 2, "scheme": { "type": "hexagonal", "level": 3 } }"#), Err(SGError::DeserializationFailed));
        assert_eq!(GridConfig::new(0, GridScheme::Full { level: 2 }).build().err(), Some(SGError::InvalidDimension));
        let mut storage = SparseGridData::new(3);
        assert_eq!(GridConfig::new(2, GridScheme::Full { level: 2 }).generate(&HashGenerator, &mut storage), Err(SGError::InvalidDimension));
        let mut config = GridConfig::new(2, GridScheme::SquareRoot { level: 2 });
        config.bounding_box = Some(BoundingBox::with_dim(3));
        assert_eq!(config.build().err(), Some(SGError::InvalidDimension));
    }

    #[test]
    fn test_generator_errors_propagate()
    {
        let config = GridConfig::new(2, GridScheme::Cliques { level: 3, clique_size: 3, t: None });
        assert_eq!(config.build().err(), Some(SGError::CliqueSizeTooLarge));
        let config = GridConfig::new(2, GridScheme::AnisotropicFull { levels: vec![2] });
        assert_eq!(config.build().err(), Some(SGError::LevelVectorMismatch));
    }
}
