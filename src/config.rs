//! Application-level configuration loading: variant rule-sets, the hidden
//! target layout, and session expiry.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::{Difficulty, GameVariant};
use crate::state::rules::{GameRules, HiddenObjectWin, ScoringRules, TargetSpec};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CROWD_HUNT_BACK_CONFIG_PATH";
/// Sessions expire two hours after creation unless configured otherwise.
const DEFAULT_SESSION_TTL_SECS: u64 = 7_200;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    session_ttl: Duration,
    hidden_object: GameRules,
    social_deduction: GameRules,
    targets: Vec<TargetSpec>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in rule-sets and target layout.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        targets = app_config.targets.len(),
                        "loaded game rule-sets from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Ruleset for the given variant.
    pub fn rules_for(&self, variant: GameVariant) -> &GameRules {
        match variant {
            GameVariant::HiddenObject => &self.hidden_object,
            GameVariant::SocialDeduction => &self.social_deduction,
        }
    }

    /// Server-side scene layout instantiated into each hidden-object session.
    pub fn target_layout(&self) -> &[TargetSpec] {
        &self.targets
    }

    /// How long a session record lives after creation.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            hidden_object: default_hidden_object_rules(),
            social_deduction: default_social_deduction_rules(),
            targets: default_target_layout(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    session_ttl_secs: u64,
    hidden_object: GameRules,
    social_deduction: GameRules,
    targets: Vec<TargetSpec>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            session_ttl: Duration::from_secs(value.session_ttl_secs),
            hidden_object: value.hidden_object,
            social_deduction: value.social_deduction,
            targets: value.targets,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn default_hidden_object_rules() -> GameRules {
    GameRules {
        min_players: 1,
        max_players: 20,
        round_seconds: 120,
        discussion_seconds: 45,
        voting_seconds: 30,
        allow_late_join: true,
        scoring: ScoringRules::Difficulty {
            easy: 10,
            medium: 25,
            hard: 50,
            speed_bonus_max: 50,
            speed_bonus_decay_secs: 5,
        },
        tasks_per_crewmate: 0,
        task_points: 0,
        hidden_object_win: HiddenObjectWin::AllTargetsFound,
    }
}

fn default_social_deduction_rules() -> GameRules {
    GameRules {
        min_players: 4,
        max_players: 10,
        round_seconds: 0,
        discussion_seconds: 45,
        voting_seconds: 30,
        allow_late_join: false,
        scoring: ScoringRules::Flat { points: 100 },
        tasks_per_crewmate: 5,
        task_points: 10,
        hidden_object_win: HiddenObjectWin::AllTargetsFound,
    }
}

/// Built-in scene layout shipped with the binary: eight figures hidden in the
/// crowd, mixing difficulty tiers across the scene.
fn default_target_layout() -> Vec<TargetSpec> {
    vec![
        TargetSpec {
            x: 8.0,
            y: 12.0,
            width: 6.0,
            height: 8.0,
            difficulty: Difficulty::Easy,
        },
        TargetSpec {
            x: 72.0,
            y: 18.0,
            width: 6.0,
            height: 7.0,
            difficulty: Difficulty::Easy,
        },
        TargetSpec {
            x: 30.0,
            y: 70.0,
            width: 5.0,
            height: 7.0,
            difficulty: Difficulty::Easy,
        },
        TargetSpec {
            x: 48.0,
            y: 35.0,
            width: 4.0,
            height: 5.0,
            difficulty: Difficulty::Medium,
        },
        TargetSpec {
            x: 15.0,
            y: 52.0,
            width: 4.0,
            height: 5.0,
            difficulty: Difficulty::Medium,
        },
        TargetSpec {
            x: 85.0,
            y: 60.0,
            width: 3.5,
            height: 5.0,
            difficulty: Difficulty::Medium,
        },
        TargetSpec {
            x: 60.0,
            y: 82.0,
            width: 2.5,
            height: 3.0,
            difficulty: Difficulty::Hard,
        },
        TargetSpec {
            x: 38.0,
            y: 8.0,
            width: 2.0,
            height: 3.0,
            difficulty: Difficulty::Hard,
        },
    ]
}
