pub mod actions;
pub mod api;
pub mod app;
pub mod async_task;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod expansion;
pub mod filter;
pub mod highlight;
pub mod main_lib;
pub mod move_target;
pub mod navigator;
pub mod screenshot;
pub mod sort;
pub mod theme;
pub mod tree;
pub mod ui;
