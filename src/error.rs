use std::{error::Error, fmt};

#[derive(Debug)]
pub enum StoreError {
    DynamoError(Box<dyn Error + Send + Sync + 'static>),
    EnvError(std::env::VarError),
    MalformedItem(String),
    TableNotReady(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use StoreError::*;
        match self {
            DynamoError(e) => Some(e.as_ref() as &dyn Error),
            EnvError(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use StoreError::*;
        match self {
            DynamoError(e) => write!(f, "DynamoError: {}", e),
            EnvError(e) => write!(f, "EnvError: {}", e),
            MalformedItem(s) => write!(f, "MalformedItem: {}", s),
            TableNotReady(s) => write!(f, "TableNotReady: {}", s),
        }
    }
}

impl From<std::env::VarError> for StoreError {
    fn from(error: std::env::VarError) -> Self {
        StoreError::EnvError(error)
    }
}

#[derive(Debug)]
pub enum ParamError {
    BadLimit(std::num::ParseIntError),
    BadTimezoneOffset(std::num::ParseIntError),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParamError::*;
        match self {
            BadLimit(e) => write!(f, "BadLimit: {}", e),
            BadTimezoneOffset(e) => write!(f, "BadTimezoneOffset: {}", e),
        }
    }
}

impl std::error::Error for ParamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ParamError::*;
        match self {
            BadLimit(e) => Some(e),
            BadTimezoneOffset(e) => Some(e),
        }
    }
}

#[derive(Debug)]
pub enum TimeError {
    ParseError(chrono::ParseError),
    OffsetOutOfRange(i64),
}

impl fmt::Display for TimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TimeError::*;
        match self {
            ParseError(e) => write!(f, "ParseError: {}", e),
            OffsetOutOfRange(offset) => write!(f, "OffsetOutOfRange: {}", offset),
        }
    }
}

impl std::error::Error for TimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use TimeError::*;
        match self {
            ParseError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<chrono::ParseError> for TimeError {
    fn from(error: chrono::ParseError) -> Self {
        TimeError::ParseError(error)
    }
}
