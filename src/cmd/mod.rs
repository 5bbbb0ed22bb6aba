pub mod hashdb;
pub mod mesh;
