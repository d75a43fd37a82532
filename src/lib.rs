pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod live;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;
pub mod validation;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
pub use store::Store;
