use nmrlink_core::graph::{highlight_keys, is_in_view};
use nmrlink_core::{
    Correlation, DisplayerMode, ExperimentType, Link, Signal, SpectrumSource, Viewport,
};

struct FakeSpectrum {
    id: &'static str,
    visible: bool,
    /// `(range or zone id, signal)`
    signals: Vec<(&'static str, Signal)>,
}

struct FakeSpectra(Vec<FakeSpectrum>);

impl SpectrumSource for FakeSpectra {
    type Spectrum = FakeSpectrum;

    fn find_spectrum(&self, id: &str, must_be_visible: bool) -> Option<&FakeSpectrum> {
        self.0
            .iter()
            .find(|spectrum| spectrum.id == id && (spectrum.visible || !must_be_visible))
    }

    fn find_signal(&self, spectrum: &FakeSpectrum, signal_id: &str) -> Option<Signal> {
        spectrum
            .signals
            .iter()
            .find(|(_, signal)| signal.id == signal_id)
            .map(|(_, signal)| signal.clone())
    }

    fn find_range_or_zone_id(
        &self,
        spectrum: &FakeSpectrum,
        _experiment_id: &str,
        signal_id: &str,
    ) -> Option<String> {
        spectrum
            .signals
            .iter()
            .find(|(_, signal)| signal.id == signal_id)
            .map(|(owner, _)| owner.to_string())
    }
}

fn hsqc_signal() -> Signal {
    Signal::two_d("s-hsqc", 1.2, 20.0)
}

/// Carbon correlation with a 1D link and one HSQC half.
fn carbon() -> Correlation {
    let mut correlation = Correlation::with_id("c1", "C", "C1", None);
    correlation.links.push(Link::one_d(
        "l-1d",
        "exp-c13",
        "C",
        Signal::one_d("s-c13", 20.0),
    ));
    let (_, c_half) = Link::two_d_pair(
        "l-hsqc",
        "exp-hsqc",
        ExperimentType::Hsqc,
        ["H", "C"],
        hsqc_signal(),
    );
    correlation.links.push(c_half);
    correlation
}

fn proton() -> Correlation {
    let mut correlation = Correlation::with_id("h1", "H", "H1", None);
    let (h_half, _) = Link::two_d_pair(
        "l-hsqc",
        "exp-hsqc",
        ExperimentType::Hsqc,
        ["H", "C"],
        hsqc_signal(),
    );
    correlation.links.push(h_half);
    correlation
}

fn spectra(c13_visible: bool) -> FakeSpectra {
    FakeSpectra(vec![
        FakeSpectrum {
            id: "exp-c13",
            visible: c13_visible,
            signals: vec![("r1", Signal::one_d("s-c13", 20.0))],
        },
        FakeSpectrum {
            id: "exp-hsqc",
            visible: true,
            signals: vec![("z1", hsqc_signal())],
        },
    ])
}

fn one_d(tab: &str, from: f64, to: f64) -> Viewport {
    Viewport {
        mode: DisplayerMode::OneD,
        x_domain: [from, to],
        y_domain: [0.0, 0.0],
        active_tab: tab.to_string(),
    }
}

fn two_d(x_domain: [f64; 2], y_domain: [f64; 2]) -> Viewport {
    Viewport {
        mode: DisplayerMode::TwoD,
        x_domain,
        y_domain,
        active_tab: "1H,13C".to_string(),
    }
}

#[test]
fn one_d_view_follows_domain_width() {
    let spectra = spectra(true);
    assert!(!is_in_view(&carbon(), &one_d("13C", 30.0, 40.0), &spectra));
    assert!(is_in_view(&carbon(), &one_d("13C", 10.0, 40.0), &spectra));
    assert!(is_in_view(&carbon(), &one_d("13C", 40.0, 10.0), &spectra));
}

#[test]
fn one_d_view_requires_matching_tab() {
    assert!(!is_in_view(&carbon(), &one_d("1H", 10.0, 40.0), &spectra(true)));
}

#[test]
fn hidden_one_d_spectrum_falls_back_to_paired_2d_signal() {
    let hidden = spectra(false);
    assert!(is_in_view(&carbon(), &one_d("13C", 15.0, 25.0), &hidden));
    assert!(!is_in_view(&carbon(), &one_d("13C", 50.0, 60.0), &hidden));
}

#[test]
fn two_d_view_checks_each_atom_on_its_axis() {
    let spectra = spectra(true);
    let viewport = two_d([0.0, 5.0], [10.0, 30.0]);
    assert!(is_in_view(&carbon(), &viewport, &spectra));
    assert!(is_in_view(&proton(), &viewport, &spectra));

    let narrow = two_d([0.0, 5.0], [50.0, 60.0]);
    assert!(!is_in_view(&carbon(), &narrow, &spectra));
    assert!(is_in_view(&proton(), &narrow, &spectra));
}

#[test]
fn domain_edge_is_compared_at_fixed_precision() {
    let mut correlation = Correlation::with_id("c2", "C", "C2", None);
    correlation.links.push(Link::one_d(
        "l-edge",
        "exp-c13",
        "C",
        Signal::one_d("s-edge", 20.000_04),
    ));
    assert!(is_in_view(&correlation, &one_d("13C", 10.0, 20.0), &spectra(true)));
}

#[test]
fn pseudo_and_unknown_data_are_never_in_view() {
    let pseudo = Correlation::new_pseudo("C", "C9");
    assert!(!is_in_view(&pseudo, &one_d("13C", -1000.0, 1000.0), &spectra(true)));

    let empty = FakeSpectra(Vec::new());
    assert!(!is_in_view(&carbon(), &one_d("13C", 10.0, 40.0), &empty));
}

#[test]
fn highlight_keys_cover_signals_owners_and_crosshairs() {
    let keys = highlight_keys(&carbon(), &spectra(false));
    assert_eq!(
        keys,
        vec![
            "c1".to_string(),
            "s-c13".to_string(),
            "r1".to_string(),
            "s-hsqc".to_string(),
            "z1".to_string(),
            "s-hsqc___Crosshair_Y".to_string(),
        ]
    );
}
