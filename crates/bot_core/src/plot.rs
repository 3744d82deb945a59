use serde_json::Value;

/// Reads a mirrored plot value and returns the tier of its crop if the crop
/// is ready to harvest.
///
/// Plot values are opaque server state; this is the only place their shape
/// is interpreted. Anything that doesn't look like a ready crop (missing
/// fields, nulls for cleared plots, unexpected types) reads as "not
/// harvestable" rather than an error.
pub fn ready_tier(plot: &Value) -> Option<&str> {
    if plot.get("readyToHarvest").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    plot.get("crop")?.get("tier")?.as_str()
}
