use serde::Serialize;

pub mod health_check;
pub mod refresh;
pub mod webhook;

#[derive(Serialize)]
pub struct ErrorMessage {
    pub error: String,
}
