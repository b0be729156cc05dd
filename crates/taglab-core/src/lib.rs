pub mod config;
pub mod errors;
pub mod model;
pub mod pacing;
pub mod providers;
pub mod storage;

pub mod evaluate;
pub mod finetune;
pub mod generate;
pub mod judgment;
pub mod prepare;
pub mod ranking;

pub mod doctor;
