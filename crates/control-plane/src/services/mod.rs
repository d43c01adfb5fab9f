// Services layer for business logic
// Services own business logic, calling storage directly and queuing side effects

pub mod cat;
pub mod thumbnail;

pub use cat::{CatPage, CatService};
pub use thumbnail::{ThumbnailGenerator, TracingThumbnailGenerator};
