use once_cell::sync::Lazy;
use std::env;

pub const RAPIDAPI_HOST: &str = "real-time-amazon-data.p.rapidapi.com";

pub static ROOT: Lazy<String> = Lazy::new(|| {
    env::var("RAPIDAPI_BASE_URL").unwrap_or_else(|_| format!("https://{RAPIDAPI_HOST}"))
});
