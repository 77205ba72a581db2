pub mod decay;
pub mod forces;
pub mod particle;
