pub mod decimal;
pub mod error;
pub mod record;
pub mod scene;

pub use decimal::format_decimal;
pub use error::BuildError;
pub use record::{Container, Keyed, RecordMap, SubRecord, SUB_RECORDS_KEY};
pub use scene::{SceneDocument, CONTAINERS_KEY};
