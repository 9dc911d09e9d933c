//! # Utilities Library
//!
//! Shared utility functions for environment variables, time, and input validation.

pub mod envs;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use envs::{get_env, get_env_bool, get_env_list, get_env_or, get_env_parse_or};
pub use time::{format_time, now_utc, unix_timestamp_secs};
pub use validation::{validate_currency_code, validate_email, validate_length};
