//! Publish-set resolution
//!
//! Starting from the changed packages, walks internal link edges and
//! unions in every transitively-reachable dependency the registry does
//! not already have.

mod closure;
mod gate;
mod publish_set;

pub use closure::dependency_closure;
pub use gate::PublishGate;
pub use publish_set::PublishSetResolver;
