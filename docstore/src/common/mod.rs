//! Values, object ids and reserved names shared by every module.

mod constants;
mod object_id;
mod value;

pub use constants::*;
pub use object_id::*;
pub use value::*;
