pub mod gold;
pub mod loader;
pub mod quality;
pub mod silver;

pub use gold::{GoldAggregator, GoldSummary};
pub use loader::{load_silver, resolve_silver_root, SilverSource};
pub use quality::{QualityGate, QualityReport};
pub use silver::SilverProcessor;
