use crate::error::{Error, Result};

/// Number of cancellation groups available when none is configured.
pub const DEFAULT_MAX_GROUPS: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub max_workers: Option<usize>,
    pub max_groups: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: None,
            max_groups: DEFAULT_MAX_GROUPS,
            thread_name_prefix: "triage-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.max_workers {
            if n == 0 {
                return Err(Error::config("max_workers must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("max_workers too large (max 1024)"));
            }
        }

        if self.max_groups == 0 {
            return Err(Error::config("max_groups must be > 0"));
        }
        if self.max_groups > 4096 {
            return Err(Error::config("max_groups too large (max 4096)"));
        }

        Ok(())
    }

    /// Worker cap, defaulting to the number of logical CPUs.
    pub fn worker_cap(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = Some(n);
        self
    }

    pub fn max_groups(mut self, n: usize) -> Self {
        self.config.max_groups = n;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = Config::builder().max_workers(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_groups_rejected() {
        let result = Config::builder().max_groups(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_values() {
        let config = Config::builder()
            .max_workers(4)
            .max_groups(16)
            .thread_name_prefix("radio")
            .build()
            .unwrap();

        assert_eq!(config.worker_cap(), 4);
        assert_eq!(config.max_groups, 16);
        assert_eq!(config.thread_name_prefix, "radio");
    }
}
