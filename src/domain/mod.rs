//! Domain layer - contract artifacts and the failure taxonomy

pub mod artifact;
