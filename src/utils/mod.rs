//! The `utils` module holds the pieces shared by every other module:
//! error types and logging setup.

pub mod error;
pub mod logging;

pub use error::{DeliveryError, RelayError};

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::logging;
    use crate::config::LogSettings;

    #[test]
    fn logging_init_can_run_twice() {
        logging::init(&LogSettings {
            level: "debug".to_string(),
        });
        logging::init_at(Level::WARN);
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(logging::level_from_str("TRACE"), Level::TRACE);
        assert_eq!(logging::level_from_str(" Warn "), Level::WARN);
        assert_eq!(logging::level_from_str("error"), Level::ERROR);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(logging::level_from_str("loud"), Level::INFO);
        assert_eq!(logging::level_from_str(""), Level::INFO);
    }
}
