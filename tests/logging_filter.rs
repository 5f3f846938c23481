use critpath::cli::LogLevel;
use critpath::logging::select_filter;

#[test]
fn flag_wins_over_env() {
    let filter = select_filter(Some(LogLevel::Debug), Some("error"));
    assert_eq!(filter.to_string(), "debug");
}

#[test]
fn env_accepts_target_directives() {
    let filter = select_filter(None, Some(" critpath=trace "));
    assert_eq!(filter.to_string(), "critpath=trace");
}

#[test]
fn falls_back_to_info() {
    assert_eq!(select_filter(None, None).to_string(), "info");
    assert_eq!(select_filter(None, Some("   ")).to_string(), "info");
    assert_eq!(select_filter(None, Some("critpath=loud")).to_string(), "info");
}
