// Chart options domain model - Time chart configuration handed to the client chart library
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub maintain_aspect_ratio: bool,
    pub legend: Legend,
    pub elements: Elements,
    pub scales: Scales,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub position: LegendPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Elements {
    pub point: PointStyle,
}

/// Points are only drawn on hover: `radius` is zero while the hit and hover
/// radii stay large enough to pick a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointStyle {
    pub radius: u32,
    pub hit_radius: u32,
    pub hover_radius: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scales {
    pub y_axes: Vec<YAxis>,
    pub x_axes: Vec<XAxis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YAxis {
    pub scale_label: ScaleLabel,
    pub ticks: Ticks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleLabel {
    pub display: bool,
    pub label_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticks {
    pub begin_at_zero: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XAxis {
    #[serde(rename = "type")]
    pub kind: AxisKind,
    pub time: TimeScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    Time,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeScale {
    pub display_formats: DisplayFormats,
}

/// moment.js format strings per time unit, interpreted by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayFormats {
    pub millisecond: String,
    pub second: String,
    pub minute: String,
    pub hour: String,
    pub day: String,
    pub week: String,
    pub month: String,
    pub quarter: String,
    pub year: String,
}

pub fn default_time_chart_options() -> ChartOptions {
    ChartOptions {
        maintain_aspect_ratio: false,
        legend: Legend {
            position: LegendPosition::Bottom,
        },
        elements: Elements {
            point: PointStyle {
                radius: 0,
                hit_radius: 10,
                hover_radius: 10,
            },
        },
        scales: Scales {
            y_axes: vec![YAxis {
                scale_label: ScaleLabel {
                    display: true,
                    label_string: String::new(),
                },
                ticks: Ticks {
                    begin_at_zero: true,
                    max: None,
                },
            }],
            x_axes: vec![XAxis {
                kind: AxisKind::Time,
                time: TimeScale {
                    display_formats: DisplayFormats {
                        millisecond: "SSS [ms]".to_string(),
                        second: "HH:mm:ss a".to_string(), // 17:20:01
                        minute: "HH:mm".to_string(),
                        hour: "HH:mm".to_string(),
                        day: "ll".to_string(), // Sep 4 2015
                        week: "ll".to_string(),
                        month: "MMM YYYY".to_string(),
                        quarter: "[Q]Q - YYYY".to_string(),
                        year: "YYYY".to_string(),
                    },
                },
            }],
        },
    }
}

/// Build chart options from the time chart template, labelling the Y axis
/// with `unit_label` (e.g. "kW").
pub fn build_options(unit_label: &str) -> ChartOptions {
    let mut options = default_time_chart_options();
    if let Some(y_axis) = options.scales.y_axes.first_mut() {
        y_axis.scale_label.label_string = unit_label.to_string();
    }
    options
}

impl ChartOptions {
    pub fn with_y_max(mut self, max: Option<f64>) -> Self {
        if let Some(y_axis) = self.scales.y_axes.first_mut() {
            y_axis.ticks.max = max;
        }
        self
    }

    pub fn y_label(&self) -> &str {
        self.scales
            .y_axes
            .first()
            .map(|y| y.scale_label.label_string.as_str())
            .unwrap_or_default()
    }
}
