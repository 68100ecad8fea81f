// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod game;
pub mod keymap;
pub mod logging;
pub mod records;
pub mod runtime;
pub mod scoring;
pub mod sentences;
pub mod session;
pub mod storage;
pub mod ui;
