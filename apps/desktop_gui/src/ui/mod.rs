//! egui front end.

pub mod app;
pub mod canvas;
pub mod i18n;
