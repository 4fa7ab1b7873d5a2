// Kernel - infrastructure shared by every domain

pub mod deps;

pub use deps::ServerDeps;
