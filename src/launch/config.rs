// config.rs - Container launch settings

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_LD_PRELOAD: &str = "/usr/lib/x86_64-linux-gnu/libjemalloc.so";
pub const DEFAULT_NP: usize = 64;

/// Docker and mpirun settings shared by every launched command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Container image holding the preprocessing binaries
    pub image: String,
    /// `host:container` bind mounts
    pub mounts: Vec<String>,
    /// Allocator preloaded into every rank; empty disables it
    pub ld_preload: String,
    /// Number of MPI ranks
    pub np: usize,
    pub docker_args: Vec<String>,
    pub mpirun_args: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            image: "codebert-prep:latest".to_string(),
            mounts: Vec::new(),
            ld_preload: DEFAULT_LD_PRELOAD.to_string(),
            np: DEFAULT_NP,
            docker_args: Vec::new(),
            mpirun_args: Vec::new(),
        }
    }
}

impl LaunchConfig {
    /// Load from TOML; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read launch config '{}': {}", path.display(), e))?;
        let config: LaunchConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse launch config '{}': {}", path.display(), e))?;
        config.validate()?;
        println!("📄 Loaded launch configuration from: {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("Launch config needs a container image".to_string());
        }
        if self.np == 0 {
            return Err("np must be at least 1".to_string());
        }
        for mount in &self.mounts {
            match mount.split_once(':') {
                Some((host, container)) if !host.is_empty() && !container.is_empty() => {}
                _ => return Err(format!("Invalid mount '{}'. Use host:container", mount)),
            }
        }
        Ok(())
    }

    pub fn generate_sample() -> String {
        format!(
            r#"# launch.toml - Container settings for codebert_launch

# Image with preprocess_codebert_pretrain and balance_dask_output on PATH
image = "codebert-prep:latest"

# Bind mounts (host:container)
mounts = [
    "/data/codebert:/workspace/codebert",
]

# Allocator preloaded into every rank ("" to disable)
ld_preload = "{}"

# Number of MPI ranks
np = {}

# Extra arguments
docker_args = []
mpirun_args = []
"#,
            DEFAULT_LD_PRELOAD, DEFAULT_NP
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_parses_and_validates() {
        let config: LaunchConfig = toml::from_str(&LaunchConfig::generate_sample()).unwrap();
        assert_eq!(config.np, 64);
        assert_eq!(config.ld_preload, DEFAULT_LD_PRELOAD);
        assert_eq!(config.mounts, vec!["/data/codebert:/workspace/codebert"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: LaunchConfig = toml::from_str("image = \"lddl:dev\"").unwrap();
        assert_eq!(config.image, "lddl:dev");
        assert_eq!(config.np, DEFAULT_NP);
        assert!(config.mounts.is_empty());
    }

    #[test]
    fn test_invalid_settings() {
        let mut config = LaunchConfig {
            mounts: vec!["/only-host".to_string()],
            ..LaunchConfig::default()
        };
        assert!(config.validate().is_err());
        config.mounts.clear();
        config.np = 0;
        assert!(config.validate().is_err());
    }
}
