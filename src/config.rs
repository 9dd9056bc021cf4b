use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ocr-preprocessor")]
#[command(about = "Image enhancement service that prepares photos and scans for OCR")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "PREPROCESS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PREPROCESS_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "PREPROCESS_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_defaults() {
        let args = Args::try_parse_from([
            "ocr-preprocessor",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--max-file-size",
            "1024",
        ])
        .unwrap();

        let config = Config::from(args);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_args_reject_invalid_port() {
        let result = Args::try_parse_from(["ocr-preprocessor", "--port", "not-a-port"]);
        assert!(result.is_err());
    }
}
