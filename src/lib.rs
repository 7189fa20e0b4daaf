pub mod app;
pub mod config;
pub mod error;
pub mod session_store;
pub mod state;

pub mod crypto {
    pub mod cookie_key;
}

pub mod models {
    pub mod player;
    pub mod session;
    pub mod token;
}

pub mod services {
    pub mod auth;
    pub mod player;
}

pub mod handlers {
    pub mod auth;
    pub mod dashboard;
    pub mod player;
}

pub mod middleware_layer {
    pub mod session;
}

pub mod validation {
    pub mod oauth;
}

pub use app::build_router;
pub use config::Config;
pub use state::AppState;
