//! Common test fixtures for tidal current tests.

/// The reference forecast product.
pub mod product {
    pub const DATASET_ID: &str = "cmems_mod_nws_phy_anfc_0.027deg-2D_PT15M-i";
    pub const EASTWARD_VARIABLE: &str = "uo";
    pub const NORTHWARD_VARIABLE: &str = "vo";
    pub const SPACING_DEGREES: f64 = 0.027;
    pub const INTERVAL_MINUTES: u32 = 15;
    /// Example daily forecast file name
    pub const SAMPLE_FILE: &str =
        "MetO-NWS-PHY-15min-CUR_20250711_b20250710_FC_R20250710.nc";
}

/// The 2x2 grid, 2 step end-to-end scenario.
///
/// At t0 cell (0,0) flows north-east at 5 m/s, cell (1,1) south-west at
/// 5 m/s and the other two cells are calm. t1 repeats t0 with the sign
/// flipped (the tide has turned).
pub mod scenario {
    pub const U: [f32; 8] = [3.0, 0.0, 0.0, -3.0, -3.0, 0.0, 0.0, 3.0];
    pub const V: [f32; 8] = [4.0, 0.0, 0.0, -4.0, -4.0, 0.0, 0.0, 4.0];
    pub const LATITUDES: [f64; 2] = [50.0, 50.027];
    pub const LONGITUDES: [f64; 2] = [-1.5, -1.473];

    /// Speed of the 5 m/s cells in knots
    pub const FAST_KNOTS: f64 = 5.0 * 1.9438444924;
    /// Compass bearing of (u=3, v=4)
    pub const NORTH_EAST_BEARING: f64 = 36.869_897_645_844_02;
    /// Compass bearing of (u=-3, v=-4)
    pub const SOUTH_WEST_BEARING: f64 = 216.869_897_645_844_02;
}

/// Common time values for testing.
pub mod time {
    /// Temporal resolutions accepted for a 15 minute source
    pub const VALID_RESOLUTIONS: [&str; 5] = ["15m", "30m", "1h", "6h", "1d"];

    /// Not a multiple of 15 minutes
    pub const INVALID_RESOLUTIONS: [&str; 3] = ["20m", "10m", "25m"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_bearings() {
        let b = (90.0 - 4.0f64.atan2(3.0).to_degrees()).rem_euclid(360.0);
        assert!((b - scenario::NORTH_EAST_BEARING).abs() < 1e-9);
        let b = (90.0 - (-4.0f64).atan2(-3.0).to_degrees()).rem_euclid(360.0);
        assert!((b - scenario::SOUTH_WEST_BEARING).abs() < 1e-9);
    }

    #[test]
    fn test_sample_file_matches_product() {
        assert!(product::SAMPLE_FILE.contains("_FC_"));
        assert!(product::SAMPLE_FILE.ends_with(".nc"));
    }
}
