use std::path::PathBuf;

/// Disables Chromium's process sandbox.
pub const NO_SANDBOX_FLAG: &str = "--no-sandbox";

/// Viewport the homepages are rendered at.
pub const VIEWPORT: (u32, u32) = (1290, 900);

/// Configuration for the capture browser.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserSettings {
    /// Run browser in headless mode
    pub headless: bool,

    /// Viewport size in CSS pixels
    pub viewport: (u32, u32),

    /// Device scale factor applied to the viewport
    pub device_scale_factor: f64,

    /// Browser executable; auto-detected when `None`
    pub chrome_executable: Option<PathBuf>,

    /// Additional Chrome flags
    pub chrome_flags: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: VIEWPORT,
            device_scale_factor: 1.0,
            chrome_executable: None,
            chrome_flags: vec![
                "--disable-gpu".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

impl BrowserSettings {
    /// Visible browser window, for watching a run.
    pub fn headed(mut self) -> Self {
        self.headless = false;
        self
    }

    pub fn with_executable(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_executable = path;
        self
    }

    /// Turn off the Chromium sandbox. Only needed where the sandbox cannot
    /// start, e.g. as root inside a container.
    pub fn without_sandbox(mut self) -> Self {
        if !self.chrome_flags.iter().any(|f| f == NO_SANDBOX_FLAG) {
            self.chrome_flags.push(NO_SANDBOX_FLAG.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BrowserSettings::default();
        assert!(settings.headless);
        assert_eq!(settings.viewport, (1290, 900));
        assert_eq!(settings.device_scale_factor, 1.0);
        assert!(settings.chrome_executable.is_none());
        assert!(!settings.chrome_flags.iter().any(|f| f == NO_SANDBOX_FLAG));
    }

    #[test]
    fn test_without_sandbox_is_opt_in_and_added_once() {
        let settings = BrowserSettings::default().without_sandbox().without_sandbox();
        let count = settings.chrome_flags.iter().filter(|f| *f == NO_SANDBOX_FLAG).count();
        assert_eq!(count, 1);
        assert!(settings.chrome_flags.contains(&"--disable-gpu".to_string()));
    }

    #[test]
    fn test_headed() {
        let settings = BrowserSettings::default().headed();
        assert!(!settings.headless);
    }

    #[test]
    fn test_with_executable() {
        let settings =
            BrowserSettings::default().with_executable(Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(settings.chrome_executable, Some(PathBuf::from("/usr/bin/chromium")));
    }
}
