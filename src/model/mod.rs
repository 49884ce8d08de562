pub mod row;
pub mod schema;
pub mod table;

pub use row::*;
pub use schema::*;
pub use table::*;
