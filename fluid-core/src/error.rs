use std::fmt;

/// Errors reported by solver construction and stepping.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Interaction radius must be positive and finite.
    InvalidInteractionRadius(f32),
    /// Rest density must be non-negative and finite.
    InvalidRestDensity(f32),
    /// Domain extents must be positive and finite.
    InvalidDomain { width: f32, height: f32 },
    /// Time step must be non-zero and finite.
    InvalidTimeStep(f32),
    /// Polygons need at least three vertices and non-degenerate edges.
    DegeneratePolygon,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidInteractionRadius(r) => {
                write!(f, "interaction radius must be positive and finite, got {r}")
            }
            SimError::InvalidRestDensity(d) => {
                write!(f, "rest density must be non-negative and finite, got {d}")
            }
            SimError::InvalidDomain { width, height } => {
                write!(f, "domain extents must be positive and finite, got {width}x{height}")
            }
            SimError::InvalidTimeStep(dt) => {
                write!(f, "time step must be non-zero and finite, got {dt}")
            }
            SimError::DegeneratePolygon => {
                write!(f, "polygon needs at least 3 vertices and non-degenerate edges")
            }
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_offending_value() {
        let msg = SimError::InvalidTimeStep(0.0).to_string();
        assert!(msg.contains('0'));

        let msg = SimError::InvalidDomain {
            width: -1.0,
            height: 600.0,
        }
        .to_string();
        assert!(msg.contains("-1"));
    }
}
