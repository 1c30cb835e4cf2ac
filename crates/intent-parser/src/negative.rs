//! Negative-sign detection by homophone
//!
//! Recognisers routinely transcribe the spoken negative sign `负` as another
//! character read "fu". Any of those anywhere in the transcript marks the
//! spoken quantity as negative.

/// `负` and its common "fu" misrecognitions.
pub const NEGATIVE_INDICATORS: &[&str] = &[
    "负", "付", "复", "府", "父", "腹", "赴", "富", "副", "妇", "抚", "辅", "俯", "斧", "釜", "脯",
    "腐", "覆", "赋", "咐", "附", "驸", "氟", "伏", "扶", "浮", "符", "芙", "苻", "蝠", "凫", "孵",
    "敷", "肤", "麸", "服", "福", "幅", "辐", "蝮", "黼", "弗", "拂", "茯", "桴", "涪", "菔", "蚨",
    "绂", "绋", "茀", "郛", "艴", "拊", "黻", "荂", "芾", "赙", "馥", "蝜", "蚹", "蜉", "鲋", "鳆",
    "鳺", "鮒", "鵩", "负的", "付的", "复的", "负得", "付得", "复得", "fu",
];

#[derive(Debug, Clone)]
pub struct NegativeSenseDetector {
    indicators: Vec<String>,
}

impl Default for NegativeSenseDetector {
    fn default() -> Self {
        Self::new(NEGATIVE_INDICATORS.iter().copied())
    }
}

impl NegativeSenseDetector {
    pub fn new<'a>(indicators: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            indicators: indicators.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// Case-insensitive search of the whole transcript. Not scoped to the
    /// numeral, so an unrelated "fu" word elsewhere also counts.
    pub fn is_negative(&self, transcript: &str) -> bool {
        let haystack = transcript.to_lowercase();
        self.indicators.iter().any(|i| haystack.contains(i.as_str()))
    }

    /// The first indicator found, for logging.
    pub fn find(&self, transcript: &str) -> Option<&str> {
        let haystack = transcript.to_lowercase();
        self.indicators
            .iter()
            .find(|i| haystack.contains(i.as_str()))
            .map(String::as_str)
    }
}

/// Convenience over the default indicator set.
pub fn is_negative(transcript: &str) -> bool {
    NegativeSenseDetector::default().is_negative(transcript)
}
