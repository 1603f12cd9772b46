// Raw and cleaned tabular row types
pub mod bar;

// Check/validation report model
pub mod checks;

// Domain-specific error types
pub mod errors;

// Engineered feature rows and trend classification
pub mod features;
