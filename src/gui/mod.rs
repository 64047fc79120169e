pub mod controls;
pub mod display;
pub mod plot_view;
pub mod sample_panel;
pub mod theme;
pub mod toolbar;
