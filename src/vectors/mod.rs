pub mod embeddings;
pub mod generator;
