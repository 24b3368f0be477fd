use crate::norm::{normalize, Stretch};
use crate::samplers::Sampler;

/// Decorator that pipes another sampler's raw output through the
/// normalization pipeline, yielding 8-bit display values.
#[derive(Debug, Clone)]
pub struct Normalizer<S> {
    inner: S,
    stretch: Stretch,
}

impl<S> Normalizer<S> {
    pub fn new(inner: S, stretch: Stretch) -> Self {
        Self { inner, stretch }
    }

    pub fn stretch(&self) -> &Stretch {
        &self.stretch
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Sampler for Normalizer<S>
where
    S: Sampler,
    S::Output: Into<f64>,
{
    type Output = u8;

    fn sample(&self, lon: &[f64], lat: &[f64]) -> Vec<u8> {
        let raw: Vec<f64> = self
            .inner
            .sample(lon, lat)
            .into_iter()
            .map(Into::into)
            .collect();
        normalize(&raw, &self.stretch)
    }
}
