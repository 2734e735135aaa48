pub mod encoding;
pub mod error;
pub mod memory;
pub mod session;
pub mod table;
pub mod tree;
pub mod value;

pub use error::{Error, Result};
pub use memory::Memory;
pub use session::{Session, SessionIter};
pub use table::{OnConflict, Table};
pub use tree::{Key, Namespace, Range, SortOrder, Tree};
pub use value::{Type, Value};
