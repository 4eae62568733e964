use serde::Serialize;

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn rule() {
    println!("{:-<70}", "");
}

pub fn heading(title: &str) {
    println!("{title}");
    rule();
}

#[must_use]
pub fn check_mark(ok: bool) -> &'static str {
    if ok { "✓" } else { "✗" }
}

/// Seconds with millisecond precision, e.g. `1.234s`.
#[must_use]
pub fn seconds(elapsed: std::time::Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}
