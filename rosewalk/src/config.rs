//! Configuration types for controlling property checks and shrinking.

use crate::shrink::{ShrinkConfig, ShrinkingMode};

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid number of iterations (must be > 0)
    InvalidIterations(usize),
}

impl ConfigError {
    /// Name of the offending configuration field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::InvalidIterations(_) => "iterations",
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidIterations(n) => {
                write!(f, "Invalid iterations count: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which error a failing check reports as its cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExceptionReport {
    /// The error raised by the original failing sample; inputs are reported unshrunk.
    First,
    /// The error raised by the shrunk counter-example.
    #[default]
    Shrunk,
}

/// Configuration for individual property checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    /// Number of samples to test
    pub iterations: usize,
    /// Optional seed for reproducible runs
    pub seed: Option<u64>,
    /// How far failing samples are shrunk
    pub shrinking_mode: ShrinkingMode,
    /// Which error is reported as the cause
    pub reported_exception: ExceptionReport,
    /// Log every shrink step
    pub verbose_shrinking: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            seed: None,
            shrinking_mode: ShrinkingMode::default(),
            reported_exception: ExceptionReport::default(),
            verbose_shrinking: false,
        }
    }
}

impl TestConfig {
    /// Create a new test configuration with validation
    pub fn new(
        iterations: usize,
        seed: Option<u64>,
        shrinking_mode: ShrinkingMode,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            iterations,
            seed,
            shrinking_mode,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the test configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.iterations));
        }
        Ok(())
    }

    /// Merge this configuration with a global configuration, with this config taking precedence
    pub fn merge_with_global(self, global: &GlobalConfig) -> Self {
        Self {
            seed: self.seed.or(global.default_seed),
            ..self
        }
    }

    /// Create a test configuration from global defaults
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            iterations: global.default_iterations,
            seed: global.default_seed,
            shrinking_mode: global.default_shrinking_mode,
            ..Self::default()
        }
    }

    /// The shrink walk settings derived from this configuration
    pub fn shrink_config(&self) -> ShrinkConfig {
        ShrinkConfig {
            mode: self.shrinking_mode,
            verbose: self.verbose_shrinking,
        }
    }
}

/// Global configuration for default test behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Default number of iterations for tests
    pub default_iterations: usize,
    /// Default seed for reproducible tests
    pub default_seed: Option<u64>,
    /// Default shrinking mode
    pub default_shrinking_mode: ShrinkingMode,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_iterations: 100,
            default_seed: None,
            default_shrinking_mode: ShrinkingMode::default(),
        }
    }
}

impl GlobalConfig {
    /// Create a new global configuration with validation
    pub fn new(
        default_iterations: usize,
        default_seed: Option<u64>,
        default_shrinking_mode: ShrinkingMode,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            default_iterations,
            default_seed,
            default_shrinking_mode,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.default_iterations));
        }
        Ok(())
    }
}

/// Holder of the global defaults
#[derive(Debug, Default)]
pub struct ConfigManager {
    global_config: GlobalConfig,
}

impl ConfigManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration manager with a custom global configuration
    pub fn with_global_config(global_config: GlobalConfig) -> Result<Self, ConfigError> {
        global_config.validate()?;
        Ok(Self { global_config })
    }

    /// Get the current global configuration
    pub fn global_config(&self) -> &GlobalConfig {
        &self.global_config
    }

    /// Update the global configuration
    pub fn set_global_config(&mut self, global_config: GlobalConfig) -> Result<(), ConfigError> {
        global_config.validate()?;
        self.global_config = global_config;
        Ok(())
    }

    /// Create a test configuration that inherits from global defaults
    pub fn create_test_config(&self) -> TestConfig {
        TestConfig::from_global(&self.global_config)
    }
}

// Thread-local global configuration manager (doc comment not allowed on thread_local!)
thread_local! {
    static CONFIG_MANAGER: std::cell::RefCell<ConfigManager> = std::cell::RefCell::new(ConfigManager::new());
}

/// Get the current global configuration
pub fn get_global_config() -> GlobalConfig {
    CONFIG_MANAGER.with(|manager| manager.borrow().global_config().clone())
}

/// Set the global configuration
pub fn set_global_config(config: GlobalConfig) -> Result<(), ConfigError> {
    CONFIG_MANAGER.with(|manager| manager.borrow_mut().set_global_config(config))
}

/// Create a test configuration that inherits from global defaults
pub fn create_test_config() -> TestConfig {
    CONFIG_MANAGER.with(|manager| manager.borrow().create_test_config())
}
