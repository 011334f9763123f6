pub mod chatbot_client;
pub mod config;
pub mod session_store;
