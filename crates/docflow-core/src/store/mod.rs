//! Form record persistence
//!
//! Records are stored as JSON objects, one key per page:
//!
//! ```json
//! {"companyName":"Festcloud.ai","companyAddress":"Lviv, Ukraine"}
//! ```

mod backend;
mod binding;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use binding::{TemplateBindingStore, DEFAULT_DEBOUNCE};
