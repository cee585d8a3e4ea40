use campspot_core::SpotId;
use serde::Deserialize;

/// `?spot_id=` on listing endpoints that always target one spot
#[derive(Debug, Deserialize)]
pub struct SpotQuery {
    /// Spot whose records are listed
    pub spot_id: SpotId,
}

/// `?spot_id=` on listing endpoints where the filter is optional
#[derive(Debug, Default, Deserialize)]
pub struct SpotFilter {
    /// Restricts the listing to one spot
    pub spot_id: Option<SpotId>,
}

/// `?q=` on location search
#[derive(Debug, Deserialize)]
pub struct LocationSearchQuery {
    /// City, country or address fragment
    pub q: String,
}
