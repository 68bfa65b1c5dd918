use std::env;

/// Runtime settings, read once at startup.
///
/// `DATABASE_URL` is mandatory; the bind address falls back to
/// `127.0.0.1:8080` when `SERVER_HOST` / `SERVER_PORT` are unset.
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env_or("SERVER_HOST", "127.0.0.1"),
            server_port: env_or("SERVER_PORT", "8080")
                .parse()
                .expect("SERVER_PORT must be a number"),
        }
    }

    /// Base URL the server will answer on, for the startup log line.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
