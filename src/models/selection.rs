use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropPolicy {
    Square,
    Ratio4x5,
    Keep,
}

impl CropPolicy {
    pub const ALL: [CropPolicy; 3] = [Self::Square, Self::Ratio4x5, Self::Keep];

    pub fn token(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Ratio4x5 => "ratio4x5",
            Self::Keep => "keep",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "Square photo (Facebook)",
            Self::Ratio4x5 => "4:5 photo (Instagram)",
            Self::Keep => "Keep original ratio",
        }
    }
}

impl FromStr for CropPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.token() == s)
            .ok_or_else(|| format!("unknown crop policy `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoChoice {
    Disoi,
    Kenh14,
    Gd,
    Ai,
    None,
}

impl LogoChoice {
    pub const ALL: [LogoChoice; 5] = [Self::Disoi, Self::Kenh14, Self::Gd, Self::Ai, Self::None];

    /// The four choices backed by an asset on disk.
    pub const WATERMARKS: [LogoChoice; 4] = [Self::Disoi, Self::Kenh14, Self::Gd, Self::Ai];

    pub fn token(self) -> &'static str {
        match self {
            Self::Disoi => "disoi",
            Self::Kenh14 => "kenh14",
            Self::Gd => "gd",
            Self::Ai => "ai",
            Self::None => "none",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disoi => "Logo Di soi sao di",
            Self::Kenh14 => "Logo Kenh14",
            Self::Gd => "Logo G-Dragon x K14",
            Self::Ai => "Logo \"AI-generated image\"",
            Self::None => "No logo",
        }
    }

    pub fn asset_file(self) -> Option<&'static str> {
        match self {
            Self::Disoi => Some("disoi.png"),
            Self::Kenh14 => Some("kenh14.png"),
            Self::Gd => Some("gd.png"),
            Self::Ai => Some("AI.png"),
            Self::None => None,
        }
    }

    /// Share of the canvas area a watermark of this identity covers.
    pub fn area_fraction(self) -> f64 {
        match self {
            Self::Kenh14 => 0.035,
            Self::Ai => 0.025,
            Self::Gd => 0.012,
            _ => 0.036,
        }
    }
}

impl FromStr for LogoChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Position and opacity tokens may carry the asset file name.
        let stem = s.strip_suffix(".png").unwrap_or(s).to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|logo| logo.token() == stem)
            .ok_or_else(|| format!("unknown logo `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    MiddleTop,
    MiddleBottom,
}

impl Anchor {
    pub const ALL: [Anchor; 7] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Center,
        Self::MiddleTop,
        Self::MiddleBottom,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
            Self::MiddleTop => "middle-top",
            Self::MiddleBottom => "middle-bottom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "Top - left corner",
            Self::TopRight => "Top - right corner",
            Self::BottomLeft => "Bottom - left corner",
            Self::BottomRight => "Bottom - right corner",
            Self::Center => "Center - custom opacity",
            Self::MiddleTop => "Middle - top",
            Self::MiddleBottom => "Middle - bottom",
        }
    }

    /// Top-left paste offset of a `logo`-sized watermark on a `canvas`.
    pub fn offset(self, canvas: (u32, u32), logo: (u32, u32)) -> (i64, i64) {
        let (cw, ch) = (i64::from(canvas.0), i64::from(canvas.1));
        let (lw, lh) = (i64::from(logo.0), i64::from(logo.1));
        match self {
            Self::TopLeft => (0, 0),
            Self::TopRight => (cw - lw, 0),
            Self::BottomLeft => (0, ch - lh),
            Self::BottomRight => (cw - lw, ch - lh),
            Self::Center => ((cw - lw).div_euclid(2), (ch - lh).div_euclid(2)),
            Self::MiddleTop => ((cw - lw).div_euclid(2), 0),
            Self::MiddleBottom => ((cw - lw).div_euclid(2), ch - lh),
        }
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|anchor| anchor.token() == s)
            .ok_or_else(|| format!("unknown position `{s}`"))
    }
}

/// Watermark opacity in `(0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Opacity(f32);

impl Opacity {
    pub const OPAQUE: Opacity = Opacity(1.0);

    pub fn new(value: f32) -> Option<Self> {
        (value > 0.0 && value <= 1.0).then_some(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn percent(self) -> u32 {
        (self.0 * 100.0).round() as u32
    }

    pub fn is_opaque(self) -> bool {
        self.0 >= 1.0
    }
}

impl FromStr for Opacity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f32 = s.parse().map_err(|_| format!("opacity `{s}` is not a number"))?;
        Self::new(value).ok_or_else(|| format!("opacity `{s}` is outside (0, 1]"))
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a finished selection run decided for a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub crop: CropPolicy,
    pub logo: LogoChoice,
    pub anchor: Option<Anchor>,
    pub opacity: Opacity,
}

impl Selection {
    pub fn position_label(&self) -> String {
        match self.anchor {
            Some(Anchor::Center) => format!("Center - {}% opacity", self.opacity.percent()),
            Some(anchor) => anchor.label().to_string(),
            None => "No placement".to_string(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "You selected:\n- {}\n- {}\n- {}",
            self.crop.label(),
            self.logo.label(),
            self.position_label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_back() {
        for policy in CropPolicy::ALL {
            assert_eq!(policy.token().parse::<CropPolicy>(), Ok(policy));
        }
        for anchor in Anchor::ALL {
            assert_eq!(anchor.token().parse::<Anchor>(), Ok(anchor));
        }
        assert_eq!("AI.png".parse::<LogoChoice>(), Ok(LogoChoice::Ai));
        assert_eq!("kenh14".parse::<LogoChoice>(), Ok(LogoChoice::Kenh14));
        assert!("4:5".parse::<CropPolicy>().is_err());
    }

    #[test]
    fn area_fractions_match_identity() {
        assert_eq!(LogoChoice::Kenh14.area_fraction(), 0.035);
        assert_eq!(LogoChoice::Ai.area_fraction(), 0.025);
        assert_eq!(LogoChoice::Gd.area_fraction(), 0.012);
        assert_eq!(LogoChoice::Disoi.area_fraction(), 0.036);
    }

    #[test]
    fn anchors_place_watermark() {
        let canvas = (1200, 1500);
        let logo = (200, 100);
        assert_eq!(Anchor::TopLeft.offset(canvas, logo), (0, 0));
        assert_eq!(Anchor::TopRight.offset(canvas, logo), (1000, 0));
        assert_eq!(Anchor::BottomLeft.offset(canvas, logo), (0, 1400));
        assert_eq!(Anchor::BottomRight.offset(canvas, logo), (1000, 1400));
        assert_eq!(Anchor::Center.offset(canvas, logo), (500, 700));
        assert_eq!(Anchor::MiddleTop.offset(canvas, logo), (500, 0));
        assert_eq!(Anchor::MiddleBottom.offset(canvas, logo), (500, 1400));
    }

    #[test]
    fn opacity_bounds() {
        assert!(Opacity::new(0.0).is_none());
        assert!(Opacity::new(1.01).is_none());
        assert_eq!("0.65".parse::<Opacity>().map(Opacity::percent), Ok(65));
        assert!("abc".parse::<Opacity>().is_err());
        assert!(Opacity::OPAQUE.is_opaque());
    }

    #[test]
    fn center_summary_mentions_opacity() {
        let selection = Selection {
            crop: CropPolicy::Square,
            logo: LogoChoice::Kenh14,
            anchor: Some(Anchor::Center),
            opacity: Opacity::new(0.75).unwrap(),
        };
        assert!(selection.summary().ends_with("Center - 75% opacity"));
    }
}
