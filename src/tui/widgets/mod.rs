pub mod calendar_grid;
pub mod chat;
pub mod color;
pub mod day_modal;
pub mod status_bar;
pub mod tabs;
