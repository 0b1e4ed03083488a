pub mod dashboard;
pub mod menu;
pub mod metrics_panel;
pub mod progress_bar;
pub mod question_card;
