// Raw source combination and validation
pub mod extraction;

// Stage graph and topological runner
pub mod pipeline;

// Post-assembly quality gate
pub mod quality;

// Cleaning, feature engineering, dataset assembly
pub mod transformation;
