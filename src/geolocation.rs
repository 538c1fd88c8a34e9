use futures::stream::{self, BoxStream, StreamExt};
use rand_distr::{Distribution, Normal};

use crate::entities::Coordinates;
use crate::error::{geolocation_unavailable_error, invalid_input_error, Error};

/// Device position samples. Pulled lazily, never restarted.
pub type GeoStream = BoxStream<'static, Result<Coordinates, Error>>;

const METRES_PER_DEGREE: f64 = 111_320.0;

/// A headless device parked around `home`, wandering `spread_m` metres (one
/// standard deviation) per sample.
pub fn jitter(home: Coordinates, spread_m: f64) -> Result<GeoStream, Error> {
    if !(spread_m.is_finite() && spread_m >= 0.0) {
        tracing::error!(spread_m, "invalid geolocation spread");
        return Err(invalid_input_error());
    }

    let normal = Normal::new(0.0, spread_m / METRES_PER_DEGREE).map_err(|err| {
        tracing::error!("invalid geolocation spread: {}", err);
        invalid_input_error()
    })?;

    let samples = stream::repeat_with(move || {
        let mut rng = rand::thread_rng();

        Ok(Coordinates {
            lat: home.lat + normal.sample(&mut rng),
            lng: home.lng + normal.sample(&mut rng),
        })
    });

    Ok(samples.boxed())
}

pub fn fixed(at: Coordinates) -> GeoStream {
    stream::repeat(Ok(at)).boxed()
}

pub fn unavailable() -> GeoStream {
    stream::repeat_with(|| Err(geolocation_unavailable_error())).boxed()
}
