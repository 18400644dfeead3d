use plotters::style::RGBColor;

/// The fixed set of range-filter competitors a report can draw.
///
/// `NoFilter` is the filterless B-tree baseline; it only appears in the
/// B-tree comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Competitor {
    Memento,
    Grafite,
    NoFilter,
    Snarf,
    Surf,
    Proteus,
    Rosetta,
    Rencoder,
}

/// Marker glyph drawn on each measured point of a series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerShape {
    Caret,
    Circle,
    Cross,
    TriangleUp,
    TriangleRight,
    Square,
    Diamond,
    X,
}

/// Immutable display style of one competitor, resolved statically.
#[derive(Clone, Copy, Debug)]
pub struct Style {
    pub marker: MarkerShape,
    pub color: RGBColor,
    pub z_order: i32,
    pub label: &'static str,
}

impl Style {
    /// Pale variant of the base color, used for the stacked modelling
    /// segment of construction bars.
    pub fn tint(&self) -> RGBColor {
        let RGBColor(r, g, b) = self.color;
        RGBColor(
            ((r as u16 + 3 * 255) / 4) as u8,
            ((g as u16 + 3 * 255) / 4) as u8,
            ((b as u16 + 3 * 255) / 4) as u8,
        )
    }
}

// Colors follow the paper's figures: fuchsia for memento, dimgray for the
// baselines, then the default matplotlib cycle for the rest.
const MEMENTO: Style = Style {
    marker: MarkerShape::Caret,
    color: RGBColor(255, 0, 255),
    z_order: 11,
    label: "Memento",
};
const GRAFITE: Style = Style {
    marker: MarkerShape::Circle,
    color: RGBColor(105, 105, 105),
    z_order: 10,
    label: "Grafite",
};
const NO_FILTER: Style = Style {
    marker: MarkerShape::Cross,
    color: RGBColor(105, 105, 105),
    z_order: 10,
    label: "Baseline",
};
const SNARF: Style = Style {
    marker: MarkerShape::TriangleUp,
    color: RGBColor(255, 127, 14),
    z_order: 2,
    label: "SNARF",
};
const SURF: Style = Style {
    marker: MarkerShape::Square,
    color: RGBColor(44, 160, 44),
    z_order: 2,
    label: "SuRF",
};
const PROTEUS: Style = Style {
    marker: MarkerShape::X,
    color: RGBColor(214, 39, 40),
    z_order: 2,
    label: "Proteus",
};
const ROSETTA: Style = Style {
    marker: MarkerShape::Diamond,
    color: RGBColor(148, 103, 189),
    z_order: 2,
    label: "Rosetta",
};
const RENCODER: Style = Style {
    marker: MarkerShape::TriangleRight,
    color: RGBColor(140, 86, 75),
    z_order: 2,
    label: "REncoder",
};

impl Competitor {
    /// File stem used by the benchmark harness for this competitor's CSVs.
    pub fn key(self) -> &'static str {
        match self {
            Competitor::Memento => "memento",
            Competitor::Grafite => "grafite",
            Competitor::NoFilter => "none",
            Competitor::Snarf => "snarf",
            Competitor::Surf => "surf",
            Competitor::Proteus => "proteus",
            Competitor::Rosetta => "rosetta",
            Competitor::Rencoder => "rencoder",
        }
    }

    pub fn style(self) -> &'static Style {
        match self {
            Competitor::Memento => &MEMENTO,
            Competitor::Grafite => &GRAFITE,
            Competitor::NoFilter => &NO_FILTER,
            Competitor::Snarf => &SNARF,
            Competitor::Surf => &SURF,
            Competitor::Proteus => &PROTEUS,
            Competitor::Rosetta => &ROSETTA,
            Competitor::Rencoder => &RENCODER,
        }
    }
}
