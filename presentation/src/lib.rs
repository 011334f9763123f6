pub mod cli;
pub mod html;
pub mod terminal_view;
