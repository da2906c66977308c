use anyhow::{Context, bail};
use stain_area::core_modules::utils::image_helper::image_helper::save_png;
use stain_area::pipeline::{EstimatorConfig, StainPipeline};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stain_area=info,stain_tester=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: stain_tester <input_image_path> [sample_count] [output_dir]");
        return Ok(());
    }
    let input_path = PathBuf::from(&args[1]);
    let config = EstimatorConfig::from_env();
    let sample_count = match args.get(2) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("sample count must be a positive integer, got {raw:?}"))?,
        None => config.default_sample_count,
    };
    let output_dir = args.get(3).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    if !output_dir.is_dir() {
        bail!("output directory {} does not exist", output_dir.display());
    }

    info!(
        input = %input_path.display(),
        sample_count,
        classification = ?config.classification,
        seed = ?config.seed,
        "Loaded configuration"
    );

    // --- 2. Load & Estimate ---
    let bytes = tokio::fs::read(&input_path)
        .await
        .with_context(|| format!("reading {}", input_path.display()))?;
    let mut pipeline = StainPipeline::new(config);
    let result = pipeline.process_bytes(bytes, sample_count).await?;

    // --- 3. Write Overlays ---
    let original_path = output_dir.join("original.png");
    let marked_path = output_dir.join("marked.png");
    save_png(&original_path, &result.original_image)?;
    save_png(&marked_path, &result.modified_image)?;

    println!(
        "{} of {} points inside the stain; estimated area {} of {} px²",
        result.points_inside,
        result.total_points,
        result.formatted_area(),
        result.total_area
    );
    println!(
        "Overlays saved to {} and {}",
        original_path.display(),
        marked_path.display()
    );
    Ok(())
}
