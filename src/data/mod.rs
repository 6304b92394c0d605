/// Data layer: container access, schema validation, the model snapshot.
///
/// Architecture:
/// ```text
///  .hdf5 / .json
///        │
///        ▼
///   ┌───────────┐
///   │ container │  named groups + datasets, backend per format
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  one validation pass against the Schema
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ MofaModel │  immutable snapshot, typed accessors
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  factor correlation
///   └──────────┘
/// ```

pub mod container;
pub mod loader;
pub mod model;
pub mod schema;
pub mod stats;
pub mod synthetic;

pub use loader::{load, load_file};
pub use model::{
    CorrelationMatrix, Factor, FeatureWeight, Group, Heatmap, MofaModel, ModelSummary, RankBy,
    VarianceQuery, VarianceRow, View,
};
pub use schema::{MatrixLayout, Schema, VarianceScale};
pub use stats::CorrelationMethod;
