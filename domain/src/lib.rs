pub mod chatbot;
pub mod models;
pub mod session;
pub mod timestamp;
pub mod transcript;
