use sggen::{config::{GridConfig, GridScheme}, errors::SGError, generators::{Generator, HashGenerator}, serialization::SerializationFormat, storage::{BoundingBox, SparseGridData}};

///
/// Builds a few 2D grids and prints their sizes.
///
fn two_d() -> Result<(), SGError>
{
    println!("\nRunning \"two_d\" example\n");
    let generator = HashGenerator;
    for level in 1..=5
    {
        let mut sparse = SparseGridData::new(2);
        generator.regular(&mut sparse, level, None)?;
        let mut boundary = SparseGridData::new(2);
        generator.regular_with_boundaries(&mut boundary, level, None)?;
        let mut full = SparseGridData::new(2);
        generator.full_with_boundaries(&mut full, level)?;
        println!("level {level}: regular {}, with boundaries {}, full with boundaries {}", sparse.len(), boundary.len(), full.len());
    }
    Ok(())
}

///
/// Builds a grid from a JSON configuration, maps it into its bounding box
/// and writes it to a buffer.
///
fn from_config() -> Result<(), SGError>
{
    println!("\nRunning \"from_config\" example\n");
    let json = r#"{
        "num_inputs": 3,
        "scheme": { "type": "truncated", "level": 4, "k": 1 },
        "bounding_box": { "lower": [-1.0, -1.0, 0.0], "upper": [1.0, 1.0, 10.0] }
    }"#;
    let config = GridConfig::from_json(json)?;
    let storage = config.build()?;
    println!("Number of points: {}", storage.len());
    println!("Number of leaves: {}", storage.nodes().filter(|p| p.is_leaf()).count());
    for point in storage.points().take(5)
    {
        println!("x={point:?}");
    }
    let mut buffer = Vec::new();
    storage.write(&mut buffer, SerializationFormat::BincodeLz4)?;
    println!("Serialized size: {} bytes", buffer.len());
    let restored = SparseGridData::read_buffer(&buffer, SerializationFormat::BincodeLz4)?;
    assert_eq!(restored.len(), storage.len());

    let config = GridConfig { num_inputs: 2, scheme: GridScheme::RegularWithPeriodicBoundaries { level: 4, t: Some(0.5) }, bounding_box: Some(BoundingBox::new(&[0.0, 0.0], &[std::f64::consts::TAU, 1.0])) };
    println!("{}", config.to_json()?);
    println!("Number of points: {}", config.build()?.len());
    Ok(())
}

fn main()
{
    two_d().unwrap();
    from_config().unwrap();
}
