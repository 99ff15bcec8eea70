// Purpose: voice assembly, the modulation matrix and cross-thread changes
// This layer sits above the processor graph and owns every voice

pub mod build;
pub mod handler;
pub mod matrix;
pub mod message;
pub mod voice;
