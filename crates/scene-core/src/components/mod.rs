pub mod collider;
pub mod markers;
pub mod name;
pub mod transform;

pub use collider::{Collider, CollisionMask, CollisionShape, LocalHit};
pub use markers::{Highlight, Selectable};
pub use name::Name;
pub use transform::Transform;
