use serde_json::{Value, json};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    None,
}

impl Visibility {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    /// Value of the `visibility` layout property.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

/// Paint property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(f64),
    /// `["interpolate", ["exponential", base], ["zoom"], z0, v0, z1, v1, ...]`
    ZoomExponential { base: f64, stops: Vec<(f64, f64)> },
}

impl Expression {
    pub fn to_json(&self) -> Value {
        match self {
            Expression::Constant(v) => json!(v),
            Expression::ZoomExponential { base, stops } => {
                let mut out = vec![
                    json!("interpolate"),
                    json!(["exponential", base]),
                    json!(["zoom"]),
                ];
                for (z, v) in stops {
                    out.push(json!(z));
                    out.push(json!(v));
                }
                Value::Array(out)
            }
        }
    }

    /// Evaluates the expression at `zoom` the way the renderer does: clamped
    /// outside the first and last stop, exponential in between.
    pub fn evaluate(&self, zoom: f64) -> f64 {
        match self {
            Expression::Constant(v) => *v,
            Expression::ZoomExponential { base, stops } => {
                let Some(&(first_z, first_v)) = stops.first() else {
                    return 0.0;
                };
                if zoom <= first_z {
                    return first_v;
                }
                for pair in stops.windows(2) {
                    let (z0, v0) = pair[0];
                    let (z1, v1) = pair[1];
                    if zoom <= z1 {
                        let t = exponential_progress(*base, zoom - z0, z1 - z0);
                        return v0 + (v1 - v0) * t;
                    }
                }
                stops.last().map(|&(_, v)| v).unwrap_or(first_v)
            }
        }
    }
}

fn exponential_progress(base: f64, offset: f64, span: f64) -> f64 {
    if span <= 0.0 {
        return 0.0;
    }
    if (base - 1.0).abs() < f64::EPSILON {
        offset / span
    } else {
        (base.powf(offset) - 1.0) / (base.powf(span) - 1.0)
    }
}
