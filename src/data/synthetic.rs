use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value as JsonValue};

// ---------------------------------------------------------------------------
// Synthetic MOFA+ models
// ---------------------------------------------------------------------------

/// Dimensions of a generated model.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// (group name, sample count)
    pub groups: Vec<(String, usize)>,
    /// (view name, feature count)
    pub views: Vec<(String, usize)>,
    pub n_factors: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            groups: vec![("G1".to_string(), 50), ("G2".to_string(), 70)],
            views: vec![("RNA".to_string(), 100), ("ATAC".to_string(), 200)],
            n_factors: 5,
            seed: 42,
        }
    }
}

/// Standard normal draw (Box-Muller).
fn gauss(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-15);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Build a model in the default (mofapy2) container layout as a JSON tree.
///
/// Weights are sparse: each factor loads strongly on a handful of features
/// per view and weakly on the rest. Variance explained is in percent and
/// decays with the factor index. Output is deterministic for a given seed.
pub fn synthetic_model(config: &SyntheticConfig) -> JsonValue {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let k = config.n_factors;

    let group_names: Vec<&str> = config.groups.iter().map(|(g, _)| g.as_str()).collect();
    let view_names: Vec<&str> = config.views.iter().map(|(v, _)| v.as_str()).collect();

    let mut samples = Map::new();
    let mut scores = Map::new();
    for (group, n) in &config.groups {
        let names: Vec<String> = (1..=*n).map(|i| format!("{group}_s{i}")).collect();
        samples.insert(group.clone(), json!(names));

        // factors x samples
        let z: Vec<Vec<f64>> = (0..k)
            .map(|_| (0..*n).map(|_| gauss(&mut rng)).collect())
            .collect();
        scores.insert(group.clone(), json!(z));
    }

    let mut features = Map::new();
    let mut weights = Map::new();
    for (view, n) in &config.views {
        let names: Vec<String> = (1..=*n).map(|i| format!("{view}_f{i}")).collect();
        features.insert(view.clone(), json!(names));

        // factors x features
        let w: Vec<Vec<f64>> = (0..k)
            .map(|_| {
                (0..*n)
                    .map(|_| {
                        let scale = if rng.random::<f64>() < 0.05 { 1.5 } else { 0.1 };
                        scale * gauss(&mut rng)
                    })
                    .collect()
            })
            .collect();
        weights.insert(view.clone(), json!(w));
    }

    let mut r2_per_factor = Map::new();
    let mut r2_total = Map::new();
    for group in &group_names {
        // views x factors
        let r2: Vec<Vec<f64>> = view_names
            .iter()
            .map(|_| {
                (0..k)
                    .map(|f| rng.random_range(0.5..15.0) / (f as f64 + 1.0))
                    .collect()
            })
            .collect();
        let totals: Vec<f64> = r2
            .iter()
            .map(|row| row.iter().sum::<f64>().min(100.0))
            .collect();
        r2_per_factor.insert(group.to_string(), json!(r2));
        r2_total.insert(group.to_string(), json!(totals));
    }

    let factor_names: Vec<String> = (1..=k).map(|i| format!("Factor{i}")).collect();

    json!({
        "groups": { "groups": group_names },
        "views": { "views": view_names },
        "factors": { "factors": factor_names },
        "samples": samples,
        "features": features,
        "expectations": { "W": weights, "Z": scores },
        "variance_explained": {
            "r2_per_factor": r2_per_factor,
            "r2_total": r2_total
        }
    })
}
