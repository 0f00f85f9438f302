// src/ui/widgets/mod.rs

pub mod disclaimer_popup;
pub mod footer;
pub mod input;
pub mod report_view; // outcome of the last route scan
pub mod summary;
