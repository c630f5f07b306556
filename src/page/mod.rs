//! Page assembly: metadata, rendering, layout, and per-document transform.

mod layout;
pub mod meta;
mod model;
pub mod render;
mod transform;

pub use layout::{LAYOUT_FILE, Layout, LayoutError};
pub use meta::{MetaError, Metadata};
pub use model::PageModel;
pub use render::RenderError;
pub use transform::{PageError, TransformContext, Transformed, transform};
