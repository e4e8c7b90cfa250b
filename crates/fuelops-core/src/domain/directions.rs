//! Directions deep links for the maps collaborator

use super::newtypes::Coordinates;

const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/?api=1";

/// Maps URL that opens turn-by-turn directions to `destination`
pub fn directions_url(destination: Coordinates) -> String {
    format!(
        "{DIRECTIONS_BASE}&destination={},{}",
        destination.latitude(),
        destination.longitude()
    )
}
