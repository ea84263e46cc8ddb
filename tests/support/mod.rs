#![allow(dead_code)]

pub mod fbpick_env;
pub mod segy;
