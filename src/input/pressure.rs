/// Control point of a pressure curve as (input percent, output percent)
pub type CurvePoint = (f64, f64);

/// Pressure response curve applied to every digitizer sample.
///
/// The curve is evaluated with de Casteljau's algorithm over the output
/// coordinates of its control points, using the normalized raw pressure as the
/// blend parameter at every level. Input coordinates are not used.
///
/// ```ignore
/// let curve = PressureCurve::new(vec![(0.0, 0.0), (50.0, 80.0), (100.0, 100.0)]);
/// let adjusted = curve.apply(4096, 8191);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PressureCurve {
    points: Vec<CurvePoint>,
}

impl Default for PressureCurve {
    fn default() -> Self {
        Self::identity()
    }
}

impl PressureCurve {
    /// Create a curve from the given control points. Curves with an
    /// unsupported number of points are kept but leave pressure untouched.
    pub fn new(points: Vec<CurvePoint>) -> Self {
        let curve = Self { points };
        if !curve.is_supported() {
            log::warn!(
                "Pressure curves need 2 to 4 control points, got {}. Pressure will not be adjusted.",
                curve.points.len()
            );
        }
        curve
    }

    /// A curve without control points, which leaves pressure untouched
    pub fn identity() -> Self {
        Self { points: vec![] }
    }

    pub fn is_identity(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if the curve has a control point count that can be evaluated
    pub fn is_supported(&self) -> bool {
        self.points.is_empty() || (2..=4).contains(&self.points.len())
    }

    /// Adjust the given raw pressure
    pub fn apply(&self, raw_pressure: u32, max_pressure: u32) -> u32 {
        apply(raw_pressure, &self.points, max_pressure)
    }
}

/// Adjust a raw pressure value with the given control points. Zero pressure
/// means the pen is not touching and is never adjusted.
pub fn apply(raw_pressure: u32, curve: &[CurvePoint], max_pressure: u32) -> u32 {
    if curve.is_empty() || raw_pressure == 0 || max_pressure == 0 {
        return raw_pressure;
    }

    let t = raw_pressure as f64 / max_pressure as f64;
    let result = match curve {
        [(_, y0), (_, y1)] => lerp(*y0, *y1, t),
        [(_, y0), (_, y1), (_, y2)] => {
            let a = lerp(*y0, *y1, t);
            let b = lerp(*y1, *y2, t);
            lerp(a, b, t)
        }
        [(_, y0), (_, y1), (_, y2), (_, y3)] => {
            let a = lerp(*y0, *y1, t);
            let b = lerp(*y1, *y2, t);
            let c = lerp(*y2, *y3, t);
            let ab = lerp(a, b, t);
            let bc = lerp(b, c, t);
            lerp(ab, bc, t)
        }
        _ => return raw_pressure,
    };

    // Float to int casts saturate, so a curve dipping below 0 reads as 0
    (result / 100.0 * max_pressure as f64) as u32
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
