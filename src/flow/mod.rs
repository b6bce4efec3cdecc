pub mod definition;
pub mod node;
pub mod path;
pub mod payload;

pub use definition::*;
pub use node::*;
pub use path::*;
pub use payload::*;
