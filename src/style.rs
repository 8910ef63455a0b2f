use eframe::egui::Color32;

use crate::model::Interpretability;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }

    fn palette(self) -> Palette {
        match self {
            Self::Dark => Palette {
                success: Color32::from_rgb(0x56, 0xc2, 0x71),
                success_hover: Color32::from_rgb(0x72, 0xd3, 0x8a),
                muted: Color32::from_rgb(0x8f, 0x99, 0xa3),
                muted_hover: Color32::from_rgb(0xa7, 0xb1, 0xba),
                edge_muted: Color32::from_rgb(0x7d, 0x87, 0x93),
                text: Color32::WHITE,
                text_outline: Color32::BLACK,
                background: Color32::from_rgb(19, 23, 29),
                edge_opacity: 0.52,
            },
            Self::Light => Palette {
                success: Color32::from_rgb(0x3d, 0xa6, 0x5a),
                success_hover: Color32::from_rgb(0x2f, 0x8f, 0x4c),
                muted: Color32::from_rgb(0x7d, 0x87, 0x93),
                muted_hover: Color32::from_rgb(0x69, 0x74, 0x80),
                edge_muted: Color32::from_rgb(0x97, 0xa1, 0xac),
                text: Color32::from_rgb(0x1a, 0x1a, 0x1a),
                text_outline: Color32::WHITE,
                background: Color32::from_rgb(246, 247, 249),
                edge_opacity: 0.62,
            },
        }
    }

    pub fn text(self) -> Color32 {
        self.palette().text
    }

    pub fn text_outline(self) -> Color32 {
        self.palette().text_outline
    }

    pub fn background(self) -> Color32 {
        self.palette().background
    }
}

struct Palette {
    success: Color32,
    success_hover: Color32,
    muted: Color32,
    muted_hover: Color32,
    edge_muted: Color32,
    text: Color32,
    text_outline: Color32,
    background: Color32,
    edge_opacity: f32,
}

pub const PRIMARY: Color32 = Color32::from_rgb(0x21, 0x96, 0xf3);
pub const WARNING: Color32 = Color32::from_rgb(0xff, 0xa7, 0x26);

/// Interaction mark of a single drawn element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkState {
    #[default]
    Plain,
    Highlighted,
    Selected,
    /// Something else is highlighted and this element is not part of it.
    Dimmed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ElementKind {
    Node,
    Edge { weight: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementStyle {
    pub fill: Color32,
    pub stroke: Color32,
    /// Border width for nodes, line width for edges.
    pub stroke_width: f32,
    /// Node diameter in world units; unused for edges.
    pub size: f32,
    pub opacity: f32,
    pub z: i32,
}

impl ElementStyle {
    pub fn fill_color(&self) -> Color32 {
        self.fill.gamma_multiply(self.opacity)
    }

    pub fn stroke_color(&self) -> Color32 {
        self.stroke.gamma_multiply(self.opacity)
    }
}

const NODE_SIZE: f32 = 50.0;

fn base_edge_width(weight: f64) -> f32 {
    ((weight.max(0.0) + 1.0).ln() * 0.34).max(1.1) as f32
}

fn emphasized_edge_width(weight: f64) -> f32 {
    ((weight.max(0.0) + 1.0).ln() * 0.4).max(1.5) as f32
}

pub fn element_style(
    kind: ElementKind,
    interpretable: Interpretability,
    mark: MarkState,
    theme: Theme,
) -> ElementStyle {
    let palette = theme.palette();
    let yes = interpretable.is_yes();

    match kind {
        ElementKind::Node => {
            let plain = ElementStyle {
                fill: if yes { palette.success } else { palette.muted },
                stroke: Color32::TRANSPARENT,
                stroke_width: 0.0,
                size: NODE_SIZE,
                opacity: 1.0,
                z: 10,
            };
            match mark {
                MarkState::Plain => plain,
                MarkState::Highlighted => ElementStyle {
                    stroke: WARNING,
                    stroke_width: 2.0,
                    z: 9999,
                    ..plain
                },
                MarkState::Selected => ElementStyle {
                    fill: if yes {
                        palette.success_hover
                    } else {
                        palette.muted_hover
                    },
                    stroke: PRIMARY,
                    stroke_width: 3.0,
                    z: 9999,
                    ..plain
                },
                MarkState::Dimmed => ElementStyle {
                    opacity: 0.2,
                    ..plain
                },
            }
        }
        ElementKind::Edge { weight } => {
            let plain = ElementStyle {
                fill: Color32::TRANSPARENT,
                stroke: if yes {
                    palette.success_hover
                } else {
                    palette.edge_muted
                },
                stroke_width: base_edge_width(weight),
                size: 0.0,
                opacity: palette.edge_opacity,
                z: 0,
            };
            match mark {
                MarkState::Plain => plain,
                MarkState::Highlighted => ElementStyle {
                    stroke: WARNING,
                    stroke_width: emphasized_edge_width(weight),
                    opacity: 0.8,
                    z: 999,
                    ..plain
                },
                MarkState::Selected => ElementStyle {
                    stroke: PRIMARY,
                    stroke_width: emphasized_edge_width(weight),
                    opacity: 1.0,
                    z: 999,
                    ..plain
                },
                MarkState::Dimmed => ElementStyle {
                    opacity: 0.12,
                    ..plain
                },
            }
        }
    }
}

/// Canvas legend: the plain node color for each interpretability value.
pub fn legend(theme: Theme) -> [(&'static str, Color32); 2] {
    [
        ("Interpretable", Interpretability::Yes),
        ("Not interpretable", Interpretability::No),
    ]
    .map(|(label, value)| {
        let style = element_style(ElementKind::Node, value, MarkState::Plain, theme);
        (label, style.fill_color())
    })
}
