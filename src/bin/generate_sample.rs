use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use mofa_viewer::data::synthetic::{synthetic_model, SyntheticConfig};

/// Usage: generate_sample [OUTPUT.json] [SEED]
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output_path = PathBuf::from(args.next().unwrap_or_else(|| "sample_model.json".to_string()));
    let mut config = SyntheticConfig::default();
    if let Some(seed) = args.next() {
        config.seed = seed
            .parse()
            .with_context(|| format!("Invalid seed '{seed}'"))?;
    }

    let model = synthetic_model(&config);

    let file = File::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &model)
        .context("Failed to write model JSON")?;

    let n_samples: usize = config.groups.iter().map(|(_, n)| n).sum();
    let n_features: usize = config.views.iter().map(|(_, n)| n).sum();
    println!(
        "Wrote synthetic model to {}: {} groups / {} samples, {} views / {} features, {} factors (seed {})",
        output_path.display(),
        config.groups.len(),
        n_samples,
        config.views.len(),
        n_features,
        config.n_factors,
        config.seed
    );
    Ok(())
}
