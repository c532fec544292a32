//! Default configuration values

/// Directory holding `build-config*.json`, relative to the working directory
pub const CONFIG_DIR: &str = "config";

/// File stem of the configuration file; profiles append `-<name>`
pub const CONFIG_FILE_STEM: &str = "build-config";

/// Directory receiving report files, relative to the working directory
pub const LOGS_DIR: &str = "logs";

/// Prefix of every persisted report file
pub const REPORT_FILE_PREFIX: &str = "build-";

/// Retries after the first build pass
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Per-project build timeout in seconds
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 30 * 60;

/// MSBuild `/p:Configuration` value
pub const DEFAULT_BUILD_CONFIGURATION: &str = "Debug";

/// MSBuild `/p:Platform` value
pub const DEFAULT_BUILD_PLATFORM: &str = "AnyCPU";

/// Maximum number of characters of tool output kept in a report
pub const MAX_DIAGNOSTIC_CHARS: usize = 4000;

/// Build tool name used when nothing better is found
pub const FALLBACK_MSBUILD: &str = "msbuild";

/// TFS client name used when nothing better is found
pub const FALLBACK_TF: &str = "tf";
