use thiserror::Error;

#[derive(Debug, Error)]
pub enum SteeringError {
    #[error("invalid steering parameter `{name}`: {value} ({reason})")]
    InvalidParameter {
        name:   &'static str,
        value:  f32,
        reason: &'static str,
    },
}

pub type SteeringResult<T> = Result<T, SteeringError>;
