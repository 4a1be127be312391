// Contract specifications: the structured record and the pipeline that extracts it
// from generator output.

pub mod extraction;
pub mod models;
