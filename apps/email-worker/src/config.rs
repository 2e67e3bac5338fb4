use core_config::server::ServerConfig;
use core_config::{app_info, env_or_default, redis::RedisConfig, AppInfo, Environment, FromEnv};
use domain_campaigns::SmtpConfig;

/// Worker configuration composed from shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub redis: RedisConfig,
    pub smtp: SmtpConfig,
    /// Bind address for the probe server (liveness/readiness)
    pub probe: ServerConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let redis = RedisConfig::from_env()?;
        let smtp = SmtpConfig::from_env()?;

        let probe_port: u16 = env_or_default("HEALTH_PORT", "8081")
            .parse()
            .map_err(|e| eyre::eyre!("Failed to parse HEALTH_PORT: {}", e))?;
        let probe = ServerConfig::new(env_or_default("HOST", "0.0.0.0"), probe_port);

        Ok(Self {
            app: app_info!(),
            environment,
            redis,
            smtp,
            probe,
        })
    }
}
