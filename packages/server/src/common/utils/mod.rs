pub mod fingerprint;
pub mod tokens;
pub mod validation;

pub use fingerprint::*;
pub use tokens::*;
pub use validation::*;
