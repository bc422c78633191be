use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        StatusResponse {
            status: "ok".to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub results: Vec<(String, f64)>,
}

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub name: String,
    pub weight: f64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
