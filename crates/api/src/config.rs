use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Root of the capture store, one directory per session.
    pub images_dir: PathBuf,
    /// Prefix of the image references handed to the display layer.
    /// Served from `images_dir` when it is a local path.
    pub images_base_url: String,
    /// Built single-page frontend to serve for unmatched routes.
    pub frontend_dir: Option<PathBuf>,
    /// JSON file overriding the default analysis configuration.
    pub analysis_config: Option<PathBuf>,
    /// Maximum number of views analysed concurrently.
    pub analysis_concurrency: Option<usize>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `IMAGES_DIR`           | `./images`                 |
    /// | `IMAGES_BASE_URL`      | `/images`                  |
    /// | `FRONTEND_DIR`         | unset                      |
    /// | `ANALYSIS_CONFIG`      | unset (built-in catalog)   |
    /// | `ANALYSIS_CONCURRENCY` | available parallelism      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let images_dir: PathBuf = std::env::var("IMAGES_DIR")
            .unwrap_or_else(|_| "./images".into())
            .into();

        let images_base_url =
            std::env::var("IMAGES_BASE_URL").unwrap_or_else(|_| "/images".into());

        let frontend_dir = non_empty_var("FRONTEND_DIR").map(PathBuf::from);
        let analysis_config = non_empty_var("ANALYSIS_CONFIG").map(PathBuf::from);

        let analysis_concurrency = non_empty_var("ANALYSIS_CONCURRENCY").map(|v| {
            v.parse::<usize>()
                .expect("ANALYSIS_CONCURRENCY must be a positive integer")
        });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            images_dir,
            images_base_url,
            frontend_dir,
            analysis_config,
            analysis_concurrency,
        }
    }

    /// Mount point for the local image directory, if the base URL is a path.
    pub fn images_mount(&self) -> Option<String> {
        let path = self.images_base_url.trim_end_matches('/');
        (path.starts_with('/') && path.len() > 1).then(|| path.to_string())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(images_base_url: &str) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![],
            request_timeout_secs: 30,
            images_dir: "./images".into(),
            images_base_url: images_base_url.into(),
            frontend_dir: None,
            analysis_config: None,
            analysis_concurrency: None,
        }
    }

    #[test]
    fn images_mount_follows_local_base_url() {
        assert_eq!(config("/images").images_mount().as_deref(), Some("/images"));
        assert_eq!(config("/static/img/").images_mount().as_deref(), Some("/static/img"));
    }

    #[test]
    fn remote_or_root_base_url_is_not_mounted() {
        assert_eq!(config("https://cdn.example.com/img").images_mount(), None);
        assert_eq!(config("/").images_mount(), None);
    }
}
