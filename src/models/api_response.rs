use serde::{Deserialize, Serialize};

/// Uniform envelope for every HTTP response.
///
/// `status` is 0 on success; `code` carries the machine-readable error
/// code on failure ("OK" otherwise).
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: i32,
    pub code: String,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: 0,
            code: "OK".to_string(),
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        Self { status: 1, code: code.to_string(), msg: msg.into(), data: None }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}
