pub mod assembler;
pub mod cleaner;
pub mod feature_engine;
