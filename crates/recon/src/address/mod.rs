//! Address gate: normalize free-form input, then reject malformed or
//! placeholder addresses before any provider is called.

mod normalize;
mod parts;
pub mod policy;
mod validate;

pub use normalize::normalize;
pub use parts::AddressParts;
pub use validate::{validate, Blocked, Rejection, Validation};
