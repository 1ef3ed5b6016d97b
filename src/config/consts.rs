/// Default name of the trajectory table inside each work unit directory
pub const DEFAULT_TRACKS_FILENAME: &str = "bigtracks.trk";
/// Default name of the status record inside each work unit directory
pub const DEFAULT_STATUS_FILENAME: &str = "trackingstatus.json";
/// Default per-unit tracking parameters file (used when no quickparams are given)
pub const DEFAULT_PARAMS_FILENAME: &str = "bigtracking.yaml";
/// Default per-unit window file
pub const DEFAULT_WINDOW_FILENAME: &str = "window.yaml";

/// Name of the built-in feature detector
pub const DEFAULT_DETECTOR: &str = "basic";

/// A worker is presumed dead after this many frame intervals without an update...
pub const HEARTBEAT_FRAME_FACTOR: f64 = 10.0;
/// ...or after this many seconds, whichever is greater.
pub const HEARTBEAT_MIN_SECONDS: f64 = 300.0;

/// Maximum number of neighbours absorbed into one point by merge/dedup
pub const MERGE_FANOUT: usize = 5;
