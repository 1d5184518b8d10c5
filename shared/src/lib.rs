pub mod claim;
pub mod claim_type;

pub use claim::*;
pub use claim_type::*;
