//! Response utilities

/// Wrap a serializable value as a successful JSON response
#[macro_export]
macro_rules! ok_json {
    ($data:expr) => {
        Ok(axum::Json($data))
    };
}
