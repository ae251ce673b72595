pub mod ids;
pub mod role;
pub mod principal;
pub mod policy;

pub use ids::*;
pub use role::*;
pub use principal::*;
pub use policy::*;
