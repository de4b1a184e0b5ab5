pub mod component;
pub mod node;
pub mod scene;
pub mod storage;

pub use component::Component;
pub(crate) use component::AnyStorage;
pub use node::NodeId;
pub use scene::{SceneError, SceneGraph};
pub use storage::ComponentStorage;
