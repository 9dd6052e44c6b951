// Fixed color palette and nearest-color classification
use serde::Serialize;

/// Category reported when no reference color is comparable (NaN channels).
pub const UNKNOWN_CATEGORY: &str = "Unknown Highlight";

/// Normalized RGB triple, each channel nominally in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Round every channel to one decimal place, ties to even.
    ///
    /// Rounding follows the exact binary value, so 0.25 becomes 0.2 while the
    /// double nearest 0.15 (slightly below it) becomes 0.1.
    pub fn quantize(self) -> Self {
        Self::new(one_decimal(self.r), one_decimal(self.g), one_decimal(self.b))
    }

    pub fn distance(&self, other: &Rgb) -> f64 {
        ((self.r - other.r).powi(2) + (self.g - other.g).powi(2) + (self.b - other.b).powi(2)).sqrt()
    }

    /// 8-bit channels, clamped. Used by the terminal theme.
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (channel(self.r), channel(self.g), channel(self.b))
    }
}

fn one_decimal(c: f64) -> f64 {
    let scaled = c * 10.0;
    let mut rounded = scaled.round_ties_even();
    if (scaled - rounded).abs() == 0.5 {
        // The product may have been rounded onto the tie; the fma residual says which side it came from
        let residual = c.mul_add(10.0, -scaled);
        if residual > 0.0 {
            rounded = scaled.ceil();
        } else if residual < 0.0 {
            rounded = scaled.floor();
        }
    }
    rounded / 10.0
}

impl From<(f64, f64, f64)> for Rgb {
    fn from((r, g, b): (f64, f64, f64)) -> Self {
        Self::new(r, g, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorReference {
    pub label: &'static str,
    pub color: Rgb,
}

/// Reference colors in tie-break order.
pub const PALETTE: [ColorReference; 5] = [
    ColorReference { label: "Technical Highlight (Yellow)", color: Rgb::new(1.0, 1.0, 0.0) },
    ColorReference { label: "Payment/Invoice (Green)", color: Rgb::new(0.0, 1.0, 0.0) },
    ColorReference { label: "Exclusion (Red)", color: Rgb::new(1.0, 0.0, 0.0) },
    ColorReference { label: "Client Deliverables (Blue)", color: Rgb::new(0.0, 0.0, 1.0) },
    ColorReference { label: "Schedules (Brown)", color: Rgb::new(0.6, 0.4, 0.2) },
];

/// Nearest palette entry. The first minimum wins on ties.
pub fn nearest(color: Rgb) -> Option<&'static ColorReference> {
    let mut best: Option<(&'static ColorReference, f64)> = None;
    for reference in PALETTE.iter() {
        let distance = color.distance(&reference.color);
        let closer = match best {
            Some((_, min)) => distance < min,
            None => !distance.is_nan(),
        };
        if closer {
            best = Some((reference, distance));
        }
    }
    best.map(|(reference, _)| reference)
}

/// Quantize, then classify. This is the order annotation colors go through.
pub fn categorize(color: Rgb) -> &'static str {
    nearest(color.quantize())
        .map(|reference| reference.label)
        .unwrap_or(UNKNOWN_CATEGORY)
}

/// Palette entry for a category label, if it is one.
pub fn reference_for(label: &str) -> Option<&'static ColorReference> {
    PALETTE.iter().find(|reference| reference.label == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_yellow_is_technical() {
        assert_eq!(categorize(Rgb::new(1.0, 1.0, 0.0)), "Technical Highlight (Yellow)");
    }

    #[test]
    fn test_every_reference_maps_to_itself() {
        for reference in PALETTE.iter() {
            assert_eq!(categorize(reference.color), reference.label);
        }
    }

    #[test]
    fn test_tie_goes_to_first_reference() {
        // 0.5 away from both yellow and green
        let between = Rgb::new(0.5, 1.0, 0.0);
        assert_eq!(between.distance(&PALETTE[0].color), between.distance(&PALETTE[1].color));
        assert_eq!(nearest(between).map(|r| r.label), Some("Technical Highlight (Yellow)"));
    }

    #[test]
    fn test_quantize_rounds_to_one_decimal() {
        assert_eq!(Rgb::new(0.96, 0.04, 0.96).quantize(), Rgb::new(1.0, 0.0, 1.0));
        assert_eq!(Rgb::new(0.61, 0.38, 0.24).quantize(), Rgb::new(0.6, 0.4, 0.2));
    }

    #[test]
    fn test_quantize_exact_ties_go_to_even() {
        assert_eq!(Rgb::new(0.25, 0.75, 0.0).quantize(), Rgb::new(0.2, 0.8, 0.0));
        // f32 values as lopdf stores them, widened
        assert_eq!(Rgb::new(0.25f32 as f64, 0.0, 0.0).quantize().r, 0.2);
        assert_eq!(Rgb::new(0.35f32 as f64, 0.0, 0.0).quantize().r, 0.3);
    }

    #[test]
    fn test_quantize_follows_binary_value_near_ties() {
        // 0.15 is stored just below .15, 0.45 just above .45
        assert_eq!(Rgb::new(0.15, 0.45, 0.35).quantize(), Rgb::new(0.1, 0.5, 0.3));
    }

    #[test]
    fn test_quarter_blue_is_brown() {
        assert_eq!(categorize(Rgb::new(0.0, 0.0, 0.25)), "Schedules (Brown)");
    }

    #[test]
    fn test_quantize_happens_before_distance() {
        // Raw color sits closer to green; rounded it ties and yellow wins.
        let raw = Rgb::new(0.46, 1.0, 0.0);
        assert_eq!(nearest(raw).map(|r| r.label), Some("Payment/Invoice (Green)"));
        assert_eq!(categorize(raw), "Technical Highlight (Yellow)");

        // Magenta after rounding is nearest to brown
        assert_eq!(categorize(Rgb::new(0.96, 0.04, 0.96)), "Schedules (Brown)");
    }

    #[test]
    fn test_nan_channels_are_unknown() {
        assert_eq!(nearest(Rgb::new(f64::NAN, 0.0, 0.0)), None);
        assert_eq!(categorize(Rgb::new(f64::NAN, 0.0, 0.0)), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_to_rgb8_clamps() {
        assert_eq!(Rgb::new(1.2, -0.1, 0.6).to_rgb8(), (255, 0, 153));
    }
}
