/// Geocoding and geospatial helpers
///
/// - [`geocoder`]: the [`Geocoder`](geocoder::Geocoder) collaborator that turns
///   free-form addresses and postal codes into coordinates
/// - [`radius`]: great-circle math behind the radius search

pub mod geocoder;
pub mod radius;

pub use geocoder::{build_geocoder, GeocodeError, GeocodedLocation, Geocoder, GeocoderConfig};
pub use radius::{angular_distance, SphericalCap, EARTH_RADIUS_MILES};
