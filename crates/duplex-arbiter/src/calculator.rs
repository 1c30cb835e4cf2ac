use serde::{Deserialize, Serialize};

/// Firing angles reported by the calculator after a calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub low_angle: Option<f64>,
    pub high_angle: Option<f64>,
}

/// The calculator the recognised commands are applied to.
pub trait CalculatorPort {
    fn set_distance(&mut self, meters: f64);

    fn set_angle(&mut self, degrees: f64);

    /// Press the calculate control. Results become readable some time later.
    fn trigger_calculation(&mut self);

    /// `None` when the calculator has no result surface to read.
    fn read_result_summary(&mut self) -> Option<ResultSummary>;
}

impl<C: CalculatorPort + ?Sized> CalculatorPort for Box<C> {
    fn set_distance(&mut self, meters: f64) {
        (**self).set_distance(meters)
    }

    fn set_angle(&mut self, degrees: f64) {
        (**self).set_angle(degrees)
    }

    fn trigger_calculation(&mut self) {
        (**self).trigger_calculation()
    }

    fn read_result_summary(&mut self) -> Option<ResultSummary> {
        (**self).read_result_summary()
    }
}
