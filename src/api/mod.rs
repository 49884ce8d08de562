pub mod context;
pub mod dispatch;
pub mod handler;
pub mod handlers;
pub mod routes;
pub mod server;

pub use context::*;
pub use dispatch::*;
pub use handler::*;
pub use handlers::*;
pub use routes::*;
pub use server::*;
