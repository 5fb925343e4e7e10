pub mod action;
pub mod app;
pub mod backend;
pub mod command;
pub mod config;
pub mod error;
pub mod flows;
pub mod markdown;
pub mod media;
pub mod models;
pub mod ui;
pub mod ui_state;
pub mod weather;
