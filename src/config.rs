pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub api_base: String,
    pub bot_token: String,
    pub operator_ids: Vec<i64>,
    pub test_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let operator_ids = std::env::var("HERALD_OPERATOR_IDS")
            .map(|raw| parse_operator_ids(&raw))
            .unwrap_or_default();

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(39180),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:herald.db?mode=rwc".to_string()),
            api_base: std::env::var("HERALD_API_BASE")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            bot_token: std::env::var("HERALD_BOT_TOKEN").expect("HERALD_BOT_TOKEN is required"),
            operator_ids,
            test_mode: std::env::var("HERALD_TEST_MODE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

fn parse_operator_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .expect("HERALD_OPERATOR_IDS must be a comma-separated list of numeric ids")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("PORT");
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("HERALD_API_BASE");
        std::env::remove_var("HERALD_BOT_TOKEN");
        std::env::remove_var("HERALD_OPERATOR_IDS");
        std::env::remove_var("HERALD_TEST_MODE");
        std::env::set_var("HERALD_BOT_TOKEN", "test-token");
    }

    #[test]
    #[serial]
    fn test_default_config() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.port, 39180);
        assert_eq!(config.database_url, "sqlite:herald.db?mode=rwc");
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert!(config.operator_ids.is_empty());
        assert!(!config.test_mode);
    }

    #[test]
    #[serial]
    fn test_port_from_env() {
        clear_env();
        std::env::set_var("PORT", "8080");
        let config = Config::from_env();
        assert_eq!(config.port, 8080);
    }

    #[test]
    #[serial]
    fn test_invalid_port_falls_back_to_default() {
        clear_env();
        std::env::set_var("PORT", "not_a_number");
        let config = Config::from_env();
        assert_eq!(config.port, 39180);
    }

    #[test]
    #[serial]
    fn test_operator_ids_parsed() {
        clear_env();
        std::env::set_var("HERALD_OPERATOR_IDS", "12345, 678 ,91011,");
        let config = Config::from_env();
        assert_eq!(config.operator_ids, vec![12345, 678, 91011]);
    }

    #[test]
    #[serial]
    #[should_panic(expected = "HERALD_OPERATOR_IDS must be")]
    fn test_non_numeric_operator_id_panics() {
        clear_env();
        std::env::set_var("HERALD_OPERATOR_IDS", "123,abc");
        Config::from_env();
    }

    #[test]
    #[serial]
    #[should_panic(expected = "HERALD_BOT_TOKEN is required")]
    fn test_missing_bot_token_panics() {
        clear_env();
        std::env::remove_var("HERALD_BOT_TOKEN");
        Config::from_env();
    }

    #[test]
    #[serial]
    fn test_test_mode_flag() {
        clear_env();
        std::env::set_var("HERALD_TEST_MODE", "true");
        let config = Config::from_env();
        assert!(config.test_mode);
    }
}
