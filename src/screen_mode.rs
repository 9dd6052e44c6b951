// Screen mode management for pdf-highlights

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenMode {
    Results, // Result lines for the open PDF
    Debug,   // Full screen debug log
}

impl ScreenMode {
    pub fn next(self) -> Self {
        match self {
            ScreenMode::Results => ScreenMode::Debug,
            ScreenMode::Debug => ScreenMode::Results,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScreenMode::Results => "RESULTS",
            ScreenMode::Debug => "DEBUG",
        }
    }
}
