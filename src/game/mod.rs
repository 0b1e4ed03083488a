pub mod input;
pub mod metrics;
pub mod question;
pub mod run;
pub mod stage;
