//! Viewport filter and highlight key building for correlation rows.
//!
//! # Responsibility
//! - Decide whether a correlation is visible in the current spectrum view.
//! - Build the highlight keys a correlation row shares with spectrum views.
//!
//! # Invariants
//! - Queries never fail; missing data answers `false` or contributes no key.
//! - Pseudo correlations are never in view.

use crate::identity;
use crate::model::correlation::Correlation;
use crate::model::link::Link;
use crate::model::signal::{Axis, Signal};

/// Deltas are compared as integers at this many steps per ppm.
pub const DELTA_PRECISION_SCALE: f64 = 10_000.0;

/// Read access to the externally owned spectrum collection.
pub trait SpectrumSource {
    type Spectrum;

    /// Finds a spectrum by id; `must_be_visible` skips hidden spectra.
    fn find_spectrum(&self, id: &str, must_be_visible: bool) -> Option<&Self::Spectrum>;
    /// Finds a signal inside one spectrum's ranges or zones.
    fn find_signal(&self, spectrum: &Self::Spectrum, signal_id: &str) -> Option<Signal>;
    /// Id of the range (1D) or zone (2D) owning `signal_id`.
    fn find_range_or_zone_id(
        &self,
        spectrum: &Self::Spectrum,
        experiment_id: &str,
        signal_id: &str,
    ) -> Option<String>;
}

/// Layout of the active spectrum viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayerMode {
    OneD,
    TwoD,
}

/// Visible chemical-shift region of the active viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub mode: DisplayerMode,
    pub x_domain: [f64; 2],
    pub y_domain: [f64; 2],
    /// Active nucleus tab, e.g. `1H` or `1H,13C`.
    pub active_tab: String,
}

impl Viewport {
    /// Atom types shown by the active tab, in axis order.
    pub fn atom_types(&self) -> Vec<String> {
        self.active_tab
            .split(',')
            .map(|nucleus| {
                nucleus
                    .trim()
                    .chars()
                    .filter(|c| c.is_ascii_alphabetic())
                    .collect::<String>()
            })
            .filter(|atom_type| !atom_type.is_empty())
            .collect()
    }

    fn domain(&self, axis: Axis) -> [f64; 2] {
        match axis {
            Axis::X => self.x_domain,
            Axis::Y => self.y_domain,
        }
    }
}

fn scaled(value: f64) -> i64 {
    (value * DELTA_PRECISION_SCALE).round() as i64
}

fn in_domain(delta: f64, domain: [f64; 2]) -> bool {
    if !delta.is_finite() || !domain[0].is_finite() || !domain[1].is_finite() {
        return false;
    }
    let (a, b) = (scaled(domain[0]), scaled(domain[1]));
    let value = scaled(delta);
    a.min(b) <= value && value <= a.max(b)
}

/// Whether `correlation` lies inside `viewport`.
pub fn is_in_view<S: SpectrumSource>(
    correlation: &Correlation,
    viewport: &Viewport,
    spectra: &S,
) -> bool {
    if correlation.pseudo {
        return false;
    }
    let atom_types = viewport.atom_types();

    match viewport.mode {
        DisplayerMode::OneD => {
            if atom_types.first() != Some(&correlation.atom_type) {
                return false;
            }
            let direct = correlation.links.iter().find(|link| link.dimension() == 1);
            if let Some(link) = direct {
                let visible = spectra.find_spectrum(&link.experiment_id, true).is_some();
                if visible && link.delta().is_some_and(|d| in_domain(d, viewport.x_domain)) {
                    return true;
                }
            }
            paired_signal_in_view(correlation, direct, viewport.x_domain, spectra)
        }
        DisplayerMode::TwoD => {
            let axis = match atom_types
                .iter()
                .position(|atom_type| *atom_type == correlation.atom_type)
            {
                Some(0) => Axis::X,
                Some(1) => Axis::Y,
                _ => return false,
            };
            let domain = viewport.domain(axis);
            let direct = correlation.links.iter().find(|link| link.dimension() == 2);
            if let Some(link) = direct {
                let visible = spectra.find_spectrum(&link.experiment_id, true).is_some();
                if visible && link.delta().is_some_and(|d| in_domain(d, domain)) {
                    return true;
                }
            }
            paired_signal_in_view(correlation, direct, domain, spectra)
        }
    }
}

/// Fallback: any other 2D link whose signal, as found in its visible
/// spectrum, sits inside `domain` on the link's axis.
fn paired_signal_in_view<S: SpectrumSource>(
    correlation: &Correlation,
    skip: Option<&Link>,
    domain: [f64; 2],
    spectra: &S,
) -> bool {
    correlation
        .links
        .iter()
        .filter(|link| link.dimension() == 2)
        .filter(|link| skip.map_or(true, |skipped| !std::ptr::eq(*link, skipped)))
        .any(|link| {
            let Some(spectrum) = spectra.find_spectrum(&link.experiment_id, true) else {
                return false;
            };
            let Some(signal) = spectra.find_signal(spectrum, &link.signal.id) else {
                return false;
            };
            signal
                .delta(link.effective_axis())
                .is_some_and(|delta| in_domain(delta, domain))
        })
}

/// Keys a correlation row highlights and reacts to.
///
/// Includes the correlation id, each link's signal id, the owning range or
/// zone id when the spectrum is known, and crosshair keys for 2D links.
pub fn highlight_keys<S: SpectrumSource>(correlation: &Correlation, spectra: &S) -> Vec<String> {
    let mut keys = vec![correlation.id.clone()];
    for link in &correlation.links {
        push_unique(&mut keys, link.signal.id.clone());
        if let Some(spectrum) = spectra.find_spectrum(&link.experiment_id, false) {
            if let Some(owner_id) =
                spectra.find_range_or_zone_id(spectrum, &link.experiment_id, &link.signal.id)
            {
                push_unique(&mut keys, owner_id);
            }
        }
        if link.dimension() == 2 {
            push_unique(
                &mut keys,
                identity::crosshair_key(&link.signal.id, link.effective_axis()),
            );
        }
    }
    keys
}

fn push_unique(keys: &mut Vec<String>, key: String) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}
