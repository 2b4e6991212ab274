pub mod bands;
pub mod config;
pub mod light;
pub mod pca;
pub mod run;
