use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Position bar measured in milliseconds of the stream
pub fn create_position_progress(duration_ms: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(duration_ms), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Position");
    pb
}

/// "m:ss.t" rendering of a millisecond offset
pub fn format_position(ms: f64) -> String {
    let tenths = (ms.max(0.0) / 100.0).floor() as u64;
    let minutes = tenths / 600;
    let seconds = (tenths % 600) / 10;
    format!("{}:{:02}.{}", minutes, seconds, tenths % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0.0), "0:00.0");
        assert_eq!(format_position(1_500.0), "0:01.5");
        assert_eq!(format_position(61_999.0), "1:01.9");
        assert_eq!(format_position(-20.0), "0:00.0");
    }
}
