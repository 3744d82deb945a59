use super::*;

#[test]
fn ready_plot_reports_its_tier() {
    let plot = json!({
        "readyToHarvest": true,
        "crop": {"species": "moonflower", "tier": "S"},
    });
    assert_eq!(ready_tier(&plot), Some("S"));
}

#[test]
fn unready_or_malformed_plots_read_as_not_harvestable() {
    let cases = [
        json!({"readyToHarvest": false, "crop": {"tier": "S"}}),
        json!({"crop": {"tier": "S"}}),
        json!({"readyToHarvest": true}),
        json!({"readyToHarvest": true, "crop": {"tier": 3}}),
        json!({"readyToHarvest": "true", "crop": {"tier": "S"}}),
        json!(null),
        json!("cleared"),
    ];
    for plot in &cases {
        assert_eq!(ready_tier(plot), None, "plot {plot} should not harvest");
    }
}
