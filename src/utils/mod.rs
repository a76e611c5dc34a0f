pub mod hash;
pub mod mask;
