#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    pub jwt_maxage: i64,
    /// Refresh token lifetime in minutes.
    pub jwt_refresh_maxage: i64,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");

        let jwt_refresh_maxage = std::env::var("JWT_REFRESH_MAXAGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 24);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| vec![
                "http://localhost:5173".to_string(),
                "http://localhost:8000".to_string(),
            ]);

        Config {
            database_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().expect("JWT_MAXAGE must be a number of minutes"),
            jwt_refresh_maxage,
            port,
            allowed_origins,
        }
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.to_string())
        .collect()
}
