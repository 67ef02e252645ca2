pub extern crate serde;
pub extern crate serde_json;

mod message;
mod presence;
mod presence_view;
mod shape;
mod types;

pub use message::*;
pub use presence::*;
pub use presence_view::*;
pub use shape::*;
pub use types::*;
