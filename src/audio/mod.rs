pub mod chunker;
pub mod wav;
