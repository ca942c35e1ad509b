//! Host-facing providers: column, context menu, properties panel and the
//! tag actions behind the menu.

pub mod actions;
pub mod column;
pub mod menu;
pub mod properties;

pub use actions::{TagActions, TagEdit};
pub use column::{ColumnDescriptor, ColumnProvider, ColumnUpdate, OperationResult};
pub use menu::{MenuAction, MenuItem, MenuProvider};
pub use properties::{PropertiesItem, PropertiesModel, PropertiesProvider};
