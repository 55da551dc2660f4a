pub mod campaigns;
pub mod packages;
pub mod system;

pub use campaigns::*;
pub use packages::*;
pub use system::*;
