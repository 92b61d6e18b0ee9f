// src/lib.rs
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod overlay;
pub mod pointer;
pub mod pose_model;
pub mod runner;
pub mod tracking;
pub mod ui;
pub mod video;
