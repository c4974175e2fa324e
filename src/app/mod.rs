pub mod handlers;
pub mod model;
pub mod state;

pub use handlers::router;
pub use state::AppState;
