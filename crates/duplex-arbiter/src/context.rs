use serde::Serialize;

/// Session state owned by a single [`DeviceArbiter`](crate::DeviceArbiter).
///
/// Created once at startup and never reset mid-session. Setting one
/// parameter leaves the other untouched.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    /// The user wants voice control on
    pub intends_listening: bool,
    /// Recognition was asked to capture and has not ended or been stopped
    pub capturing: bool,
    /// Last reported focus state (focused until told otherwise)
    pub focused: bool,
    pub last_distance: Option<f64>,
    pub last_angle: Option<f64>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            intends_listening: false,
            capturing: false,
            focused: true,
            last_distance: None,
            last_angle: None,
        }
    }
}

impl SessionContext {
    /// Both calculator inputs have been supplied at least once.
    pub fn parameters(&self) -> Option<(f64, f64)> {
        Some((self.last_distance?, self.last_angle?))
    }
}
