mod placeholder;
mod store;

pub use placeholder::{expand_placeholders, Placeholders, ID_TOKEN, POSITION_TOKEN};
pub use store::{TemplateStore, PACKAGES_DIR};
