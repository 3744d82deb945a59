use std::time::Duration;

pub const GAME_URL: &str = "https://magicgarden.gg";
const DEFAULT_DRIVER_CMD: &str = "node driver/driver.js";

/// Deployment configuration, read from environment variables. Parsing is a
/// pure function over a lookup closure so tests never touch the process
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub game_url: String,
    /// Command line used to launch the browser-driver subprocess.
    pub driver_cmd: String,

    pub engine_tick: Duration,
    pub idle_threshold: Duration,
    pub auto_reconnect: bool,
    pub reconnect_wait: Duration,

    pub enable_harvest: bool,
    pub enable_sell: bool,
    pub enable_buy: bool,
    pub enable_plant: bool,
    pub harvest_tier: String,
    pub buy_allowed_seeds: Vec<String>,

    /// Forward only every Nth transport frame to the patch applier. Trades
    /// update latency for CPU; 1 disables sampling.
    pub ws_frame_throttle: u64,
    /// Log every applied state event at debug level.
    pub debug_ws: bool,

    // Passed through to the driver, which owns the browser session.
    pub persist_session: bool,
    pub browser_profile_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            game_url: get("GAME_URL").unwrap_or_else(|| GAME_URL.to_string()),
            driver_cmd: get("DRIVER_CMD").unwrap_or_else(|| DEFAULT_DRIVER_CMD.to_string()),
            engine_tick: secs_f64(&get, "ENGINE_TICK", 0.2),
            idle_threshold: secs_f64(&get, "IDLE_THRESHOLD", 15.0),
            auto_reconnect: bool_var(&get, "AUTO_RECONNECT", true),
            reconnect_wait: Duration::from_secs(int_var(&get, "RECONNECT_WAIT_MINUTES", 5) * 60),
            enable_harvest: bool_var(&get, "ENABLE_HARVEST", false),
            enable_sell: bool_var(&get, "ENABLE_SELL", false),
            enable_buy: bool_var(&get, "ENABLE_BUY", false),
            enable_plant: bool_var(&get, "ENABLE_PLANT", false),
            harvest_tier: get("HARVEST_TIER").unwrap_or_else(|| "S".to_string()),
            buy_allowed_seeds: list_var(&get, "BUY_ALLOWED_SEEDS"),
            ws_frame_throttle: int_var(&get, "WS_FRAME_THROTTLE", 5).max(1),
            debug_ws: bool_var(&get, "DEBUG_WS", false),
            persist_session: bool_var(&get, "PERSIST_SESSION", false),
            browser_profile_dir: get("BROWSER_PROFILE_DIR")
                .unwrap_or_else(|| "/app/browser-profile".to_string()),
        }
    }

    /// Frame ingestion is skipped entirely when nothing would consume the
    /// mirror (CPU optimization).
    pub fn any_module_enabled(&self) -> bool {
        self.enable_harvest || self.enable_sell || self.enable_buy || self.enable_plant
    }
}

fn bool_var(get: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    get(key).map_or(default, |value| value == "true")
}

fn secs_f64(get: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> Duration {
    let secs = get(key)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .unwrap_or(default);
    Duration::from_secs_f64(secs)
}

fn int_var(get: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    get(key)
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn list_var(get: &impl Fn(&str) -> Option<String>, key: &str) -> Vec<String> {
    get(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}
