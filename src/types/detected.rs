/// A detector's successful value together with its report line.
#[derive(Debug, Clone, PartialEq)]
pub struct Detected<T> {
    pub value: T,
    pub message: String,
}

impl<T> Detected<T> {
    pub fn new(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            message: message.into(),
        }
    }
}
