pub mod band;
pub mod capture;
pub mod config;
pub mod consts;
pub mod error;
pub mod frame;
pub mod hardware;
pub mod io;
pub mod pca;
pub mod progress;
pub mod timelapse;
