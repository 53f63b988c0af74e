/// An error that occurred while running or observing a future.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operating system refused to create the producer thread for a future.
    #[error("failed to spawn producer thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The computation of the future panicked. Holds the panic message.
    #[error("future computation panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = Error::Panicked("out of range".to_string());
        assert_eq!(error.to_string(), "future computation panicked: out of range");

        let error = Error::Spawn(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "no threads left",
        ));
        assert_eq!(
            error.to_string(),
            "failed to spawn producer thread: no threads left"
        );
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_result_alias() {
        fn check(value: u8) -> Result<u8> {
            if value == 0 {
                return Err(Error::Panicked("zero".to_string()));
            }
            Ok(value)
        }
        assert!(matches!(check(1), Ok(1)));
        assert!(matches!(check(0), Err(Error::Panicked(message)) if message == "zero"));
    }
}
