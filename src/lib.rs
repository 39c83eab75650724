pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod frame;
pub mod loaders;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod tracking;
pub mod types;
