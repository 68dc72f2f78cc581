use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuadtreeError {
    InvalidRectangleDims { width: f32, height: f32 },
    InvalidCircleRadius { radius: f32 },
    InvalidCoordinates { x: f32, y: f32 },
    InvalidRotation { angle: f32 },
    DuplicateItem { value: u32 },
}

pub type QuadtreeResult<T> = Result<T, QuadtreeError>;

impl fmt::Display for QuadtreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuadtreeError::InvalidRectangleDims { width, height } => {
                write!(
                    f,
                    "rectangle width/height must be finite and non-negative (width: {}, height: {})",
                    width, height
                )
            }
            QuadtreeError::InvalidCircleRadius { radius } => {
                write!(
                    f,
                    "circle radius must be finite and non-negative (radius: {})",
                    radius
                )
            }
            QuadtreeError::InvalidCoordinates { x, y } => {
                write!(f, "coordinates must be finite (x: {}, y: {})", x, y)
            }
            QuadtreeError::InvalidRotation { angle } => {
                write!(f, "rotation angle must be finite (angle: {})", angle)
            }
            QuadtreeError::DuplicateItem { value } => {
                write!(
                    f,
                    "item {} is already in the quadtree; relocate or delete it first",
                    value
                )
            }
        }
    }
}

impl std::error::Error for QuadtreeError {}
