use std::time::Duration;

pub const DEFAULT_BROKER_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_TOPIC: &str = "listing_created";
pub const DEFAULT_CONSUMER_GROUP: &str = "listing-quality-group";
pub const DEFAULT_IMAGE_ANALYSIS_URL: &str = "http://localhost:5001/api/v1/image/analyze";
pub const DEFAULT_TEXT_ANALYSIS_URL: &str = "http://localhost:5002/api/v1/text/analyze";
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:3000/api/v1/products";
pub const DEFAULT_CONSUMER_NAME: &str = "listing-quality-1";

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub url: String,
    pub topic: String,
    pub group: String,
    pub consumer_name: String,
    pub batch_size: usize,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(15),
            connect: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub broker: BrokerConfig,
    pub image_analysis_url: String,
    pub text_analysis_url: String,
    pub catalog_url: String,
    /// When set the mock catalog keeps records in Redis instead of memory.
    pub catalog_redis_url: Option<String>,
    pub port: u16,
    pub http: HttpTimeouts,
    pub body_limit: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        let broker = BrokerConfig {
            url: string("BROKER_URL", DEFAULT_BROKER_URL),
            topic: string("LISTING_TOPIC", DEFAULT_TOPIC),
            group: string("CONSUMER_GROUP", DEFAULT_CONSUMER_GROUP),
            // stable across restarts so pending entries are picked up again
            consumer_name: optional("CONSUMER_NAME")
                .or_else(|| optional("HOSTNAME").map(|host| format!("listing-quality-{host}")))
                .unwrap_or_else(|| DEFAULT_CONSUMER_NAME.to_string()),
            batch_size: number("CONSUMER_BATCH_SIZE", 16) as usize,
            poll_interval: Duration::from_millis(number("POLL_INTERVAL_MS", 500)),
        };

        Self {
            broker,
            image_analysis_url: string("IMAGE_ANALYSIS_SERVICE_URL", DEFAULT_IMAGE_ANALYSIS_URL),
            text_analysis_url: string("TEXT_ANALYSIS_SERVICE_URL", DEFAULT_TEXT_ANALYSIS_URL),
            catalog_url: string("PRODUCT_CATALOG_API_URL", DEFAULT_CATALOG_URL),
            catalog_redis_url: optional("CATALOG_REDIS_URL"),
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(3000),
            http: HttpTimeouts {
                request: Duration::from_secs(number("HTTP_TIMEOUT_SECS", 15)),
                connect: Duration::from_secs(number("HTTP_CONNECT_TIMEOUT_SECS", 5)),
            },
            body_limit: number("REQUEST_MAX_BYTES", 256 * 1024) as usize,
        }
    }
}
