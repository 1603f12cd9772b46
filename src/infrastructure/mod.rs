pub mod sources;
pub mod storage;
