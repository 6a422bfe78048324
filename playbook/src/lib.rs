pub mod decision;
pub mod summary;
pub mod analysis;

pub use decision::*;
pub use summary::*;
pub use analysis::*;
